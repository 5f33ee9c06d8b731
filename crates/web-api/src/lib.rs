//! Web API 层。
//!
//! 通过 Axum 暴露 GraphQL 查询、变更与订阅，把调用委托给应用层的用例服务。

pub mod auth;
pub mod error;
mod routes;
pub mod schema;
mod state;

pub use auth::{Caller, IdentityResolver, JwtService};
pub use error::ApiError;
pub use routes::{router, GRAPHQL_PATH, SUBSCRIPTION_PATH};
pub use schema::{build_schema, SocialSchema};
pub use state::AppState;
