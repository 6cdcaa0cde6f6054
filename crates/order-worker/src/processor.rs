//! 订单状态任务处理器
//!
//! 执行单个状态迁移任务：写入目标状态、加载归属用户、
//! 通过邮件渠道投递状态变更通知。
//!
//! ## 幂等语义
//!
//! 任务信封携带由订单号和目标状态派生的幂等键。同一逻辑迁移无论被投递
//! 多少次，通知只发送一次：处理成功后记录幂等键，重复投递直接跳过。
//! 幂等键在通知发送成功后才记录，因此"状态已写入但通知失败"的任务
//! 在重试时会补发通知而不会重复写状态。

use std::sync::Arc;

use dashmap::DashSet;
use tracing::{info, instrument, warn};

use notification_service::{NotificationDispatcher, OrderStatusUpdated};
use store_shared::error::StoreError;
use store_shared::jobs::OrderStatusJob;
use store_shared::orders::OrderRepository;

use crate::error::{Result, WorkerError};

/// 版本冲突时的重读次数上限
///
/// 冲突意味着有并发写入者，重读最新版本后重试即可收敛；
/// 连续冲突超过上限则交由外层的任务级重试处理。
const MAX_CONFLICT_RETRIES: u32 = 3;

/// 任务执行结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// 任务完成；status_changed 标记本次执行是否实际写入了状态
    Completed { status_changed: bool },
    /// 幂等键已记录，重复投递被跳过
    DuplicateSkipped,
}

/// 订单状态任务处理器
pub struct OrderStatusProcessor {
    orders: Arc<dyn OrderRepository>,
    dispatcher: Arc<NotificationDispatcher>,
    /// 已完成任务的幂等键集合
    ///
    /// 内存实现覆盖单进程内的重复投递；跨进程部署时
    /// 替换为共享存储（与订单仓储同库）即可。
    processed_keys: DashSet<String>,
}

impl OrderStatusProcessor {
    pub fn new(orders: Arc<dyn OrderRepository>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self {
            orders,
            dispatcher,
            processed_keys: DashSet::new(),
        }
    }

    /// 幂等键是否已处理
    pub fn is_processed(&self, idempotency_key: &str) -> bool {
        self.processed_keys.contains(idempotency_key)
    }

    fn mark_processed(&self, idempotency_key: &str) {
        self.processed_keys.insert(idempotency_key.to_string());
    }

    /// 执行状态迁移任务
    #[instrument(
        skip(self, job),
        fields(
            job_id = %job.job_id,
            order_id = job.order_id,
            target_status = %job.target_status,
        )
    )]
    pub async fn execute(&self, job: &OrderStatusJob) -> Result<JobOutcome> {
        if self.is_processed(&job.idempotency_key) {
            info!(
                idempotency_key = %job.idempotency_key,
                "任务已处理过，跳过重复投递"
            );
            return Ok(JobOutcome::DuplicateSkipped);
        }

        let mut order = self
            .orders
            .find(job.order_id)
            .await?
            .ok_or(WorkerError::OrderNotFound {
                order_id: job.order_id,
            })?;

        // 状态写入：携带读取版本做乐观并发校验，
        // 冲突时重读最新版本再试。状态已是目标值时不再写入。
        let mut status_changed = false;
        let mut conflict_retries: u32 = 0;
        while order.status() != job.target_status {
            match self
                .orders
                .update_status(order.order_id(), order.version(), job.target_status)
                .await
            {
                Ok(updated) => {
                    order = updated;
                    status_changed = true;
                    break;
                }
                Err(StoreError::VersionConflict { .. })
                    if conflict_retries < MAX_CONFLICT_RETRIES =>
                {
                    conflict_retries += 1;
                    warn!(conflict_retries, "状态写入版本冲突，重读订单后重试");
                    order = self
                        .orders
                        .find(job.order_id)
                        .await?
                        .ok_or(WorkerError::OrderNotFound {
                            order_id: job.order_id,
                        })?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        // 加载订单归属用户并投递状态变更通知
        let user = self
            .orders
            .find_user(order.user_id())
            .await?
            .ok_or_else(|| WorkerError::OwnerNotFound {
                user_id: order.user_id().to_string(),
            })?;

        let notification = OrderStatusUpdated::new(&order);
        let result = self
            .dispatcher
            .dispatch(&notification, &user)
            .await
            .map_err(|e| WorkerError::Dispatch(e.to_string()))?;

        // 渠道失败触发任务级重试；渠道跳过（如接收人无邮箱）不算失败
        if result.failure_count() > 0 {
            return Err(WorkerError::Dispatch(format!(
                "{} 个渠道投递失败",
                result.failure_count()
            )));
        }

        self.mark_processed(&job.idempotency_key);

        info!(
            status_changed,
            idempotency_key = %job.idempotency_key,
            "状态迁移任务完成"
        );

        Ok(JobOutcome::Completed { status_changed })
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
