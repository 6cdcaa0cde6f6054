//! 路由配置模块
//!
//! 定义订单 REST 端点的路由映射；调用方在 main.rs 中挂载
//! `/api` 前缀并套上 CORS 层。

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, state::AppState};

/// 构建订单相关的路由
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(handlers::orders::place_order))
        .route("/orders/{id}", get(handlers::orders::get_order))
        .route(
            "/orders/{id}/tracking",
            post(handlers::orders::set_tracking),
        )
        .route(
            "/orders/{id}/status",
            post(handlers::orders::update_status),
        )
}

/// 构建完整的 API 路由
pub fn api_routes() -> Router<AppState> {
    Router::new().merge(order_routes())
}
