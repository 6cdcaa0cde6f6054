//! 订单相关 handler
//!
//! 下单、查询、写运单号与发货、请求状态迁移。
//! 每个操作先经过策略注册表授权；通知分发异步执行（fire-and-forget），
//! 投递失败记录日志但不影响订单主流程。

use axum::Json;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use tracing::{error, info, warn};
use validator::Validate;

use notification_service::{NewOrder, OrderShipped};
use store_shared::jobs::{JobQueue, OrderStatusJob};
use store_shared::orders::{OrderRepository, User};

use crate::dto::{
    ApiResponse, JobAcceptedResponse, OrderResponse, SetTrackingRequest, UpdateStatusRequest,
};
use crate::error::ApiError;
use crate::policy::{Actor, EntityKind, PolicyAction};
use crate::state::AppState;

/// 从请求头提取请求主体
///
/// 身份由上游认证中间件注入：`x-user-id` 为用户标识，
/// `x-user-roles` 为逗号分隔的角色列表。缺少用户标识视为未认证。
fn actor_from_headers(headers: &HeaderMap) -> Result<Actor, ApiError> {
    let user_id = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or(ApiError::Unauthorized)?;

    let roles = headers
        .get("x-user-roles")
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect()
        })
        .unwrap_or_default();

    Ok(Actor::new(user_id, roles))
}

/// 下单
///
/// 创建订单后向店铺运营分发新订单通知（邮件 + 站内记录）。
pub async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    if !state
        .policies
        .check(EntityKind::Order, &actor, PolicyAction::Create, None)
    {
        return Err(ApiError::Forbidden("创建订单".to_string()));
    }

    let order = state.orders.create(&actor.user_id).await?;

    info!(order_id = order.order_id(), user_id = %actor.user_id, "订单已创建");

    // 新订单通知发给店铺运营，异步执行不阻塞下单响应
    let dispatcher = state.dispatcher.clone();
    let notification = NewOrder::new(&order, &state.notify.admin_base_url);
    let admin = User {
        user_id: state.notify.admin_user_id.clone(),
        name: "Store Operations".to_string(),
        email: state.notify.admin_email.clone(),
    };
    tokio::spawn(async move {
        match dispatcher.dispatch(&notification, &admin).await {
            Ok(result) if !result.success => {
                warn!(
                    success_count = result.success_count(),
                    failure_count = result.failure_count(),
                    "新订单通知部分渠道投递失败"
                );
            }
            Ok(_) => {}
            Err(e) => error!(error = %e, "新订单通知分发异常"),
        }
    });

    Ok(Json(ApiResponse::ok(order.into())))
}

/// 查询订单
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    let order = state
        .orders
        .find(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound {
            entity: "订单".to_string(),
            id: order_id.to_string(),
        })?;

    if !state.policies.check(
        EntityKind::Order,
        &actor,
        PolicyAction::View,
        Some(order.user_id()),
    ) {
        return Err(ApiError::Forbidden("查看订单".to_string()));
    }

    Ok(Json(ApiResponse::ok(order.into())))
}

/// 写入运单号并发货
///
/// 运单号写入成功后向订单归属用户分发发货通知。
/// 通知的构建要求运单号已存在，这一前置条件在此流程中恒成立。
pub async fn set_tracking(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<SetTrackingRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    if !state
        .policies
        .check(EntityKind::Order, &actor, PolicyAction::Update, None)
    {
        return Err(ApiError::Forbidden("更新订单".to_string()));
    }

    req.validate()
        .map_err(|e| ApiError::Validation(e.to_string()))?;

    // 订单不存在时仓储返回 NotFound，经 Shared 变体映射为 404
    let order = state.orders.set_tracking(order_id, &req.tracking_id).await?;

    info!(
        order_id,
        tracking_id = %req.tracking_id,
        "运单号已写入，准备分发发货通知"
    );

    // 发货通知发给订单归属用户
    let dispatcher = state.dispatcher.clone();
    let orders = state.orders.clone();
    let tracking_base_url = state.notify.tracking_base_url.clone();
    let notify_order = order.clone();
    tokio::spawn(async move {
        let recipient = match orders.find_user(notify_order.user_id()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(user_id = %notify_order.user_id(), "订单归属用户不存在，跳过发货通知");
                return;
            }
            Err(e) => {
                error!(error = %e, "查询订单归属用户失败");
                return;
            }
        };

        let notification = match OrderShipped::new(&notify_order, &tracking_base_url) {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "构建发货通知失败");
                return;
            }
        };

        if let Err(e) = dispatcher.dispatch(&notification, &recipient).await {
            error!(error = %e, "发货通知分发异常");
        }
    });

    Ok(Json(ApiResponse::ok(order.into())))
}

/// 请求状态迁移
///
/// 校验订单存在后入队状态迁移任务，由后台 worker 执行
/// 状态写入与状态变更通知。
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<JobAcceptedResponse>>, ApiError> {
    let actor = actor_from_headers(&headers)?;

    if !state
        .policies
        .check(EntityKind::Order, &actor, PolicyAction::Update, None)
    {
        return Err(ApiError::Forbidden("更新订单".to_string()));
    }

    if state.orders.find(order_id).await?.is_none() {
        return Err(ApiError::NotFound {
            entity: "订单".to_string(),
            id: order_id.to_string(),
        });
    }

    let job = OrderStatusJob::new(order_id, req.status);
    state.jobs.enqueue(&job).await?;

    info!(
        job_id = %job.job_id,
        order_id,
        target_status = %req.status,
        "状态迁移任务已入队"
    );

    Ok(Json(ApiResponse::ok(JobAcceptedResponse::from(&job))))
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
