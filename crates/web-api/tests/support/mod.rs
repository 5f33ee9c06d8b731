#![allow(dead_code)]

use std::{
    net::SocketAddr,
    path::Path,
    sync::{Arc, Mutex},
};

use application::{InMemoryStore, ObjectStorage, StorageError};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use config::{AppConfig, StorageBackend};
use infrastructure::{object_storage_from_config, BcryptPasswordHasher, Infrastructure, Repositories};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use web_api::{router, AppState};

/// 只记录写入内容的对象存储
#[derive(Default)]
pub struct RecordingStorage {
    pub stored: Mutex<Vec<(String, Vec<u8>)>>,
}

#[async_trait]
impl ObjectStorage for RecordingStorage {
    async fn put(&self, filename: &str, bytes: Vec<u8>) -> Result<String, StorageError> {
        self.stored
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes));
        Ok(format!("https://cdn.test/uploads/{filename}"))
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: InMemoryStore,
    /// 使用真实本地存储时为 `None`
    pub storage: Option<Arc<RecordingStorage>>,
}

impl TestApp {
    pub fn new() -> Self {
        let storage = Arc::new(RecordingStorage::default());
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Gcs;
        let mut app = Self::build(&config, storage.clone());
        app.storage = Some(storage);
        app
    }

    /// 本地目录存储，上传文件由 `/static` 对外提供
    pub fn with_local_storage(root: &Path) -> Self {
        let mut config = AppConfig::default();
        config.storage.backend = StorageBackend::Local;
        config.storage.local_root = root.to_string_lossy().into_owned();
        let object_storage = object_storage_from_config(&config.storage);
        Self::build(&config, object_storage)
    }

    fn build(config: &AppConfig, object_storage: Arc<dyn ObjectStorage>) -> Self {
        let store = InMemoryStore::new();
        let infrastructure = Infrastructure {
            repositories: Repositories::in_memory(store.clone()),
            password_hasher: Arc::new(BcryptPasswordHasher::new(4)),
            object_storage,
        };
        let state = AppState::new(infrastructure, config);
        Self {
            router: router(state.clone()),
            state,
            store,
            storage: None,
        }
    }

    /// 在随机端口上启动真实服务，供 WebSocket 客户端连接
    pub async fn serve(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let router = self.router.clone();
        tokio::spawn(async move {
            axum::serve(listener, router).await.ok();
        });
        addr
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("request");
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = serde_json::from_slice(&body_bytes).unwrap_or(json!({}));
        (status, body)
    }

    /// 执行一次 GraphQL 请求，`token` 为空时匿名
    pub async fn graphql(&self, token: Option<&str>, query: &str, variables: Value) -> Value {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/graphql")
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = builder
            .body(Body::from(
                json!({ "query": query, "variables": variables }).to_string(),
            ))
            .unwrap();
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::OK, "unexpected status: {body}");
        body
    }

    /// 注册并登录，返回 (用户 ID, token)
    pub async fn sign_up(&self, first_name: &str, email: &str) -> (String, String) {
        let created = self
            .graphql(
                None,
                r#"mutation($first: String, $email: String) {
                    createUser(firstName: $first, lastName: "Tester", email: $email, age: 28, password: "hunter2") { id }
                }"#,
                json!({ "first": first_name, "email": email }),
            )
            .await;
        let id = created["data"]["createUser"]["id"]
            .as_str()
            .unwrap_or_else(|| panic!("createUser failed: {created}"))
            .to_string();

        let login = self
            .graphql(
                None,
                r#"mutation($email: String) { login(email: $email, password: "hunter2") { token } }"#,
                json!({ "email": email }),
            )
            .await;
        let token = login["data"]["login"]["token"]
            .as_str()
            .unwrap_or_else(|| panic!("login failed: {login}"))
            .to_string();
        (id, token)
    }
}

pub fn error_code(body: &Value) -> Option<&str> {
    body["errors"][0]["extensions"]["code"].as_str()
}

/// GraphQL multipart 上传请求，文件绑定到 `singleUpload(file:)`
pub fn upload_request(filename: &str, content: &[u8]) -> Request<Body> {
    let boundary = "X-SOCIAL-BOUNDARY";
    let mut body = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"operations\"\r\n\r\n\
{{\"query\":\"mutation($file: Upload!) {{ singleUpload(file: $file) {{ url }} }}\",\"variables\":{{\"file\":null}}}}\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"map\"\r\n\r\n\
{{\"0\":[\"variables.file\"]}}\r\n\
--{b}\r\nContent-Disposition: form-data; name=\"0\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        b = boundary
    )
    .into_bytes();
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/graphql")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}
