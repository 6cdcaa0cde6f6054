//! 请求与响应 DTO
//!
//! 请求体使用 validator 做字段级校验；响应统一包装为
//! `{success, data}` 形式。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use store_shared::jobs::OrderStatusJob;
use store_shared::orders::{Order, OrderStatus};

// ---------------------------------------------------------------------------
// 请求
// ---------------------------------------------------------------------------

/// 写入运单号请求
#[derive(Debug, Deserialize, Validate)]
pub struct SetTrackingRequest {
    #[validate(length(min = 1, message = "运单号不能为空"))]
    pub tracking_id: String,
}

/// 状态迁移请求
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

// ---------------------------------------------------------------------------
// 响应
// ---------------------------------------------------------------------------

/// 统一成功响应包装
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// 订单视图
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub order_id: i64,
    pub user_id: String,
    pub status: OrderStatus,
    pub tracking_id: Option<String>,
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.order_id(),
            user_id: order.user_id().to_string(),
            status: order.status(),
            tracking_id: order.tracking_id().map(str::to_string),
            version: order.version(),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
        }
    }
}

/// 任务已入队响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAcceptedResponse {
    pub job_id: String,
    pub order_id: i64,
    pub target_status: OrderStatus,
}

impl From<&OrderStatusJob> for JobAcceptedResponse {
    fn from(job: &OrderStatusJob) -> Self {
        Self {
            job_id: job.job_id.clone(),
            order_id: job.order_id,
            target_status: job.target_status,
        }
    }
}
