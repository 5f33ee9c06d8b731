use std::sync::Arc;

use async_graphql::{http::GraphiQLSource, Data};
use async_graphql_axum::{GraphQLProtocol, GraphQLRequest, GraphQLResponse, GraphQLWebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use domain::UserId;
use tokio::sync::Mutex;
use config::STATIC_MOUNT_PATH;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    schema::{build_schema, SocialSchema},
    state::AppState,
};

pub const GRAPHQL_PATH: &str = "/graphql";
pub const SUBSCRIPTION_PATH: &str = "/graphql/ws";

#[derive(Clone)]
struct GraphqlState {
    schema: SocialSchema,
    app: AppState,
}

pub fn router(state: AppState) -> Router {
    let static_root = state.static_root.clone();
    let graphql = GraphqlState {
        schema: build_schema(state.clone()),
        app: state,
    };

    let mut router = Router::new()
        .route("/health", get(health))
        .route(GRAPHQL_PATH, get(graphiql).post(graphql_handler))
        .route(SUBSCRIPTION_PATH, get(subscription_handler))
        .with_state(graphql);

    // 本地存储的上传文件
    if let Some(root) = static_root {
        router = router.nest_service(STATIC_MOUNT_PATH, ServeDir::new(root));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn graphiql() -> impl IntoResponse {
    Html(
        GraphiQLSource::build()
            .endpoint(GRAPHQL_PATH)
            .subscription_endpoint(SUBSCRIPTION_PATH)
            .finish(),
    )
}

/// 执行查询与变更；`Authorization` 头解析出的身份作为请求数据注入
async fn graphql_handler(
    State(state): State<GraphqlState>,
    headers: HeaderMap,
    request: GraphQLRequest,
) -> GraphQLResponse {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    let caller = state.app.identity.resolve_bearer(header).await;

    state
        .schema
        .execute(request.into_inner().data(caller))
        .await
        .into()
}

/// GraphQL 订阅连接。
///
/// 身份在 `connection_init` 阶段解析一次并在整个连接内沿用；
/// 带身份的连接会计入在线状态，断开后扣除。
async fn subscription_handler(
    State(state): State<GraphqlState>,
    protocol: GraphQLProtocol,
    upgrade: WebSocketUpgrade,
) -> Response {
    upgrade
        .protocols(async_graphql::http::ALL_WEBSOCKET_PROTOCOLS)
        .on_upgrade(move |socket| async move {
            let connected: Arc<Mutex<Option<UserId>>> = Arc::new(Mutex::new(None));
            let identity = state.app.identity.clone();
            let presence = state.app.presence.clone();
            let init_connected = connected.clone();
            let init_presence = presence.clone();

            GraphQLWebSocket::new(socket, state.schema.clone(), protocol)
                .on_connection_init(move |params| async move {
                    let caller = identity.resolve_connection_params(&params).await;
                    if let Some(user_id) = caller.user_id() {
                        if let Err(err) = init_presence.connected(user_id).await {
                            tracing::warn!(user_id = %user_id, error = %err, "更新在线状态失败");
                        }
                        *init_connected.lock().await = Some(user_id);
                        tracing::info!(user_id = %user_id, "订阅连接已建立");
                    }

                    let mut data = Data::default();
                    data.insert(caller);
                    Ok(data)
                })
                .serve()
                .await;

            let closed = connected.lock().await.take();
            if let Some(user_id) = closed {
                if let Err(err) = presence.disconnected(user_id).await {
                    tracing::warn!(user_id = %user_id, error = %err, "更新离线状态失败");
                }
                tracing::info!(user_id = %user_id, "订阅连接已断开");
            }
        })
}
