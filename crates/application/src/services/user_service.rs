use std::sync::Arc;

use domain::{
    Age, DomainError, PersonName, ProfileUpdate, RepositoryError, User, UserEmail, UserId,
};

use crate::{
    clock::Clock, error::ApplicationError, password::PasswordHasher, repository::UserRepository,
};

/// 搜索结果的最大条数
pub const SEARCH_LIMIT: i64 = 50;

/// 注册请求。GraphQL 参数全部可选，这里统一校验。
#[derive(Debug, Clone, Default)]
pub struct RegisterUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AuthenticateUserRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EditProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub age: Option<i32>,
    pub bio: Option<String>,
    pub profile_pic: Option<String>,
}

pub struct UserServiceDependencies {
    pub user_repository: Arc<dyn UserRepository>,
    pub password_hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn Clock>,
}

pub struct UserService {
    deps: UserServiceDependencies,
}

fn required<T>(value: Option<T>) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::invalid_argument("user", "Please fill all fields"))
}

impl UserService {
    pub fn new(deps: UserServiceDependencies) -> Self {
        Self { deps }
    }

    pub async fn register(&self, request: RegisterUserRequest) -> Result<User, ApplicationError> {
        let first_name = PersonName::parse("first_name", required(request.first_name)?)?;
        let last_name = PersonName::parse("last_name", required(request.last_name)?)?;
        let email = UserEmail::parse(required(request.email)?)?;
        let age = Age::parse(required(request.age)?)?;
        let password = required(request.password)?;
        if password.is_empty() {
            return Err(DomainError::invalid_argument("password", "cannot be empty").into());
        }

        if self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .is_some()
        {
            return Err(DomainError::UserAlreadyExists.into());
        }

        let password_hash = self.deps.password_hasher.hash(&password).await?;
        let user = User::register(
            UserId::generate(),
            email,
            first_name,
            last_name,
            age,
            password_hash,
            self.deps.clock.now(),
        );

        // 并发注册同一邮箱时由唯一约束兜底
        let stored = match self.deps.user_repository.create(user).await {
            Err(RepositoryError::Conflict) => return Err(DomainError::UserAlreadyExists.into()),
            other => other?,
        };
        tracing::info!(user_id = %stored.id, "新用户注册");
        Ok(stored)
    }

    pub async fn authenticate(
        &self,
        request: AuthenticateUserRequest,
    ) -> Result<User, ApplicationError> {
        let email = request
            .email
            .ok_or_else(|| DomainError::invalid_argument("email", "is required"))?;
        let password = request
            .password
            .ok_or_else(|| DomainError::invalid_argument("password", "is required"))?;
        let email = UserEmail::parse(email).map_err(|_| ApplicationError::Authentication)?;

        let user = self
            .deps
            .user_repository
            .find_by_email(&email)
            .await?
            .ok_or(ApplicationError::Authentication)?;

        let password_ok = self
            .deps
            .password_hasher
            .verify(&password, &user.password)
            .await?;
        if !password_ok {
            return Err(ApplicationError::Authentication);
        }

        Ok(user)
    }

    pub async fn find_user(&self, user_id: UserId) -> Result<Option<User>, ApplicationError> {
        Ok(self.deps.user_repository.find_by_id(user_id).await?)
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<User, ApplicationError> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| DomainError::UserNotFound.into())
    }

    pub async fn edit_profile(
        &self,
        user_id: UserId,
        request: EditProfileRequest,
    ) -> Result<User, ApplicationError> {
        let update = ProfileUpdate {
            first_name: request
                .first_name
                .map(|v| PersonName::parse("first_name", v))
                .transpose()?,
            last_name: request
                .last_name
                .map(|v| PersonName::parse("last_name", v))
                .transpose()?,
            age: request.age.map(Age::parse).transpose()?,
            bio: request.bio,
            profile_pic: request.profile_pic,
        };

        let mut user = self.get_user(user_id).await?;
        user.apply_profile(update, self.deps.clock.now());
        Ok(self.deps.user_repository.update(user).await?)
    }

    /// 按姓名模糊搜索，空查询返回空列表
    pub async fn search(&self, query: &str) -> Result<Vec<User>, ApplicationError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .deps
            .user_repository
            .search_by_name(query, SEARCH_LIMIT)
            .await?)
    }
}
