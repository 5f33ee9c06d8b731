//! JWT 认证与调用者身份解析
//!
//! 凭据的任何问题（缺失、格式错误、签名无效、过期、用户不存在）都统一解析为匿名，
//! 只有需要身份的操作才会报错。

use std::sync::Arc;

use application::UserService;
use config::JwtConfig;
use domain::UserId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// JWT Claims 结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64, // 过期时间 (Unix timestamp)
}

/// JWT Token 服务
#[derive(Clone)]
pub struct JwtService {
    config: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.secret.as_ref());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 生成 JWT token
    pub fn generate_token(&self, user_id: UserId) -> Result<String, ApiError> {
        let exp = chrono::Utc::now() + chrono::Duration::hours(self.config.expiration_hours);
        let claims = Claims {
            sub: user_id.into(),
            exp: exp.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|err| ApiError::internal_server_error(format!("token generation failed: {err}")))
    }

    /// 验证并解析 JWT token
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|token_data| token_data.claims)
            .map_err(|err| ApiError::unauthorized(format!("invalid token: {err}")))
    }
}

/// 请求上下文中的调用者身份，`None` 表示匿名
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Caller(pub Option<UserId>);

impl Caller {
    pub fn anonymous() -> Self {
        Self(None)
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.0
    }

    /// 需要身份的操作调用
    pub fn require(&self) -> Result<UserId, ApiError> {
        self.0
            .ok_or_else(|| ApiError::forbidden("authentication required"))
    }
}

/// 把凭据解析为调用者身份，从不返回错误
#[derive(Clone)]
pub struct IdentityResolver {
    jwt_service: Arc<JwtService>,
    user_service: Arc<UserService>,
}

impl IdentityResolver {
    pub fn new(jwt_service: Arc<JwtService>, user_service: Arc<UserService>) -> Self {
        Self {
            jwt_service,
            user_service,
        }
    }

    /// 解析 `Authorization: Bearer <token>` 头
    pub async fn resolve_bearer(&self, header: Option<&str>) -> Caller {
        match header.and_then(|value| value.strip_prefix("Bearer ")) {
            Some(token) => self.resolve_token(token.trim()).await,
            None => Caller::anonymous(),
        }
    }

    /// WebSocket 握手参数：`authToken`（裸 token）或 `Authorization`（Bearer 头）
    pub async fn resolve_connection_params(&self, params: &serde_json::Value) -> Caller {
        if let Some(token) = params.get("authToken").and_then(|v| v.as_str()) {
            return self.resolve_token(token).await;
        }
        let header = params
            .get("Authorization")
            .or_else(|| params.get("authorization"))
            .and_then(|v| v.as_str());
        self.resolve_bearer(header).await
    }

    pub async fn resolve_token(&self, token: &str) -> Caller {
        let claims = match self.jwt_service.verify_token(token) {
            Ok(claims) => claims,
            Err(err) => {
                tracing::debug!(error = %err, "凭据无效，按匿名处理");
                return Caller::anonymous();
            }
        };

        let user_id = UserId::from(claims.sub);
        match self.user_service.find_user(user_id).await {
            Ok(Some(user)) => Caller(Some(user.id)),
            Ok(None) => {
                tracing::debug!(user_id = %user_id, "凭据对应的用户不存在");
                Caller::anonymous()
            }
            Err(err) => {
                tracing::warn!(user_id = %user_id, error = %err, "查询凭据用户失败，按匿名处理");
                Caller::anonymous()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use application::{InMemoryStore, SystemClock, UserRepository, UserServiceDependencies};
    use chrono::Utc;
    use domain::{Age, PasswordHash, PersonName, User, UserEmail};
    use infrastructure::BcryptPasswordHasher;
    use serde_json::json;

    use super::*;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    /// 带一个已注册用户的解析器
    async fn resolver_with_user() -> (IdentityResolver, Arc<JwtService>, UserId) {
        let store = InMemoryStore::new();
        let user = User::register(
            UserId::generate(),
            UserEmail::parse("ada@example.com").unwrap(),
            PersonName::parse("first_name", "Ada").unwrap(),
            PersonName::parse("last_name", "Lovelace").unwrap(),
            Age::parse(36).unwrap(),
            PasswordHash::new("unused").unwrap(),
            Utc::now(),
        );
        let user_id = user.id;
        UserRepository::create(&store, user).await.unwrap();

        let users = Arc::new(UserService::new(UserServiceDependencies {
            user_repository: Arc::new(store),
            password_hasher: Arc::new(BcryptPasswordHasher::new(4)),
            clock: Arc::new(SystemClock),
        }));
        let jwt_service = Arc::new(jwt(SECRET, 1));
        (
            IdentityResolver::new(jwt_service.clone(), users),
            jwt_service,
            user_id,
        )
    }

    #[tokio::test]
    async fn connection_params_accept_auth_token_and_bearer_header() {
        let (resolver, jwt_service, user_id) = resolver_with_user().await;
        let token = jwt_service.generate_token(user_id).unwrap();
        let expected = Caller(Some(user_id));

        let params = json!({ "authToken": &token });
        assert_eq!(resolver.resolve_connection_params(&params).await, expected);

        let params = json!({ "Authorization": format!("Bearer {token}") });
        assert_eq!(resolver.resolve_connection_params(&params).await, expected);

        let params = json!({ "authorization": format!("Bearer {token}") });
        assert_eq!(resolver.resolve_connection_params(&params).await, expected);
    }

    #[tokio::test]
    async fn bad_or_missing_connection_params_are_anonymous() {
        let (resolver, jwt_service, user_id) = resolver_with_user().await;
        let token = jwt_service.generate_token(user_id).unwrap();
        let stranger = jwt_service.generate_token(UserId::generate()).unwrap();

        for params in [
            json!({ "authToken": "garbage" }),
            json!({ "Authorization": token }),
            json!({ "Authorization": "Bearer garbage" }),
            json!({ "authToken": stranger }),
            json!({ "authToken": 42 }),
            json!({}),
            serde_json::Value::Null,
        ] {
            assert_eq!(
                resolver.resolve_connection_params(&params).await,
                Caller::anonymous(),
                "params: {params}"
            );
        }
    }

    fn jwt(secret: &str, hours: i64) -> JwtService {
        JwtService::new(JwtConfig {
            secret: secret.to_string(),
            expiration_hours: hours,
        })
    }

    #[test]
    fn token_round_trip() {
        let service = jwt(SECRET, 1);
        let user_id = UserId::generate();
        let token = service.generate_token(user_id).unwrap();
        let claims = service.verify_token(&token).unwrap();
        assert_eq!(UserId::from(claims.sub), user_id);
    }

    #[test]
    fn foreign_and_expired_tokens_are_rejected() {
        let ours = jwt(SECRET, 1);
        let theirs = jwt("fedcba9876543210fedcba9876543210", 1);
        let token = theirs.generate_token(UserId::generate()).unwrap();
        assert!(ours.verify_token(&token).is_err());

        // 超过默认 60 秒的宽限期
        let expired = jwt(SECRET, -2)
            .generate_token(UserId::generate())
            .unwrap();
        assert!(ours.verify_token(&expired).is_err());
        assert!(ours.verify_token("not.a.jwt").is_err());
    }

    #[test]
    fn anonymous_caller_cannot_act() {
        assert!(Caller::anonymous().require().is_err());
        let user_id = UserId::generate();
        assert_eq!(Caller(Some(user_id)).require().unwrap(), user_id);
    }
}
