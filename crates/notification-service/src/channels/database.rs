//! 站内记录投递渠道
//!
//! 将通知的记录内容写入通知存储，供应用内消息中心展示。
//! 不支持站内记录的通知类型会被跳过。

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::info;

use store_shared::orders::User;

use super::DeliveryChannel;
use crate::builders::OrderNotification;
use crate::error::Result;
use crate::store::NotificationStore;
use crate::types::{Channel, ChannelOutcome, NotificationRecord};

/// 站内记录投递渠道
pub struct DatabaseChannel {
    store: Arc<dyn NotificationStore>,
}

impl DatabaseChannel {
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DeliveryChannel for DatabaseChannel {
    fn channel_type(&self) -> Channel {
        Channel::Database
    }

    fn name(&self) -> &str {
        "Database"
    }

    async fn is_available(&self, _recipient: &User) -> bool {
        // 站内记录对所有接收人可用
        true
    }

    async fn deliver(
        &self,
        recipient: &User,
        notification: &dyn OrderNotification,
    ) -> Result<ChannelOutcome> {
        let start = Instant::now();

        let Some(content) = notification.render_record() else {
            return Ok(ChannelOutcome::skipped(
                self.channel_type(),
                "该通知类型不支持站内记录",
            ));
        };

        let record = NotificationRecord::new(&recipient.user_id, content);
        let record_id = record.record_id.clone();

        match self.store.insert(record).await {
            Ok(()) => {
                info!(
                    channel = "DATABASE",
                    notification = notification.name(),
                    user_id = %recipient.user_id,
                    record_id = %record_id,
                    "站内通知已写入"
                );

                Ok(ChannelOutcome::success(
                    self.channel_type(),
                    Some(record_id),
                    start.elapsed().as_millis() as u64,
                ))
            }
            Err(e) => Ok(ChannelOutcome::failed(
                self.channel_type(),
                e.to_string(),
                start.elapsed().as_millis() as u64,
            )),
        }
    }
}
