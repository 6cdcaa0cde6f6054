//! 通知分发器
//!
//! 根据通知类型声明的渠道集合，将内容并行投递到各个已注册渠道。
//!
//! ## 设计说明
//!
//! - **多渠道并行**：各渠道独立投递，互不影响
//! - **部分失败容忍**：单渠道失败不影响其他渠道，结果中逐渠道记录
//! - **纯渲染/投递分离**：内容渲染由通知类型完成，分发器只负责路由与投递

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use store_shared::orders::User;

use crate::builders::OrderNotification;
use crate::channels::DeliveryChannel;
use crate::error::Result;
use crate::types::{Channel, ChannelOutcome, DispatchResult};

/// 通知分发器
///
/// 持有已注册的投递渠道，按通知类型的渠道集合路由。
/// 构建一次后注入到需要发送通知的服务中。
#[derive(Default)]
pub struct NotificationDispatcher {
    channels: Vec<Arc<dyn DeliveryChannel>>,
}

impl NotificationDispatcher {
    pub fn new() -> Self {
        Self {
            channels: Vec::new(),
        }
    }

    /// 注册投递渠道
    pub fn register(mut self, channel: Arc<dyn DeliveryChannel>) -> Self {
        info!(
            channel_type = ?channel.channel_type(),
            channel_name = channel.name(),
            "注册通知投递渠道"
        );
        self.channels.push(channel);
        self
    }

    /// 获取已注册的渠道类型
    pub fn registered_channel_types(&self) -> Vec<Channel> {
        self.channels.iter().map(|c| c.channel_type()).collect()
    }

    /// 分发通知
    ///
    /// 根据通知类型声明的渠道集合筛选已注册渠道，并行投递。
    #[instrument(
        skip(self, notification, recipient),
        fields(
            notification = notification.name(),
            user_id = %recipient.user_id,
        )
    )]
    pub async fn dispatch(
        &self,
        notification: &dyn OrderNotification,
        recipient: &User,
    ) -> Result<DispatchResult> {
        let start = Instant::now();

        let wanted = notification.channels();
        let target_channels: Vec<_> = self
            .channels
            .iter()
            .filter(|c| wanted.contains(&c.channel_type()))
            .cloned()
            .collect();

        if target_channels.is_empty() {
            warn!("没有匹配的投递渠道");
            return Ok(DispatchResult::new(
                notification.name(),
                vec![],
                start.elapsed().as_millis() as u64,
            ));
        }

        debug!(target_channel_count = target_channels.len(), "找到匹配的渠道");

        // 并行投递到所有渠道
        let futures: Vec<_> = target_channels
            .iter()
            .map(|channel| {
                let channel = channel.clone();
                async move {
                    let outcome = channel.deliver(recipient, notification).await;
                    (channel.channel_type(), outcome)
                }
            })
            .collect();

        let results = join_all(futures).await;

        let outcomes: Vec<ChannelOutcome> = results
            .into_iter()
            .map(|(channel_type, outcome)| match outcome {
                Ok(o) => o,
                Err(e) => {
                    error!(channel = ?channel_type, error = %e, "渠道投递异常");
                    ChannelOutcome::failed(channel_type, e.to_string(), 0)
                }
            })
            .collect();

        let result = DispatchResult::new(
            notification.name(),
            outcomes,
            start.elapsed().as_millis() as u64,
        );

        self.log_result(&result);
        Ok(result)
    }

    fn log_result(&self, result: &DispatchResult) {
        let success_count = result.success_count();
        let failure_count = result.failure_count();
        let total = result.outcomes.len();

        if result.success {
            info!(
                notification = result.notification,
                success_count,
                total,
                duration_ms = result.duration_ms,
                "通知分发完成（全部成功）"
            );
        } else if result.is_partial_success() {
            warn!(
                notification = result.notification,
                success_count,
                failure_count,
                total,
                duration_ms = result.duration_ms,
                "通知分发完成（部分成功）"
            );
        } else {
            error!(
                notification = result.notification,
                failure_count,
                total,
                duration_ms = result.duration_ms,
                "通知分发完成（全部失败）"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
