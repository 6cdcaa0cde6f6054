//! 邮件投递渠道
//!
//! 当前为模拟实现：渲染邮件内容并记录结构化日志。
//! 生产环境替换为 SMTP 或邮件服务商（如 SendGrid、AWS SES）的调用，
//! 只需保持同一 trait。

use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use store_shared::orders::User;

use super::DeliveryChannel;
use crate::builders::OrderNotification;
use crate::error::Result;
use crate::types::{Channel, ChannelOutcome};

/// 邮件渠道配置
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub enabled: bool,
    /// 发件人地址
    pub from_address: String,
    pub from_name: String,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            from_address: "noreply@storefront.test".to_string(),
            from_name: "Storefront".to_string(),
        }
    }
}

/// 邮件投递渠道
pub struct MailChannel {
    config: MailerConfig,
}

impl MailChannel {
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(MailerConfig::default())
    }

    /// 模拟发送邮件，返回消息标识
    async fn send_mail(&self, recipient: &User, notification: &dyn OrderNotification) -> Result<String> {
        // 模拟网络延迟
        tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;

        let mail = notification.render_mail();

        // 模拟发送失败
        #[cfg(test)]
        if recipient.email.contains("fail-mail") {
            return Err(crate::error::NotificationError::SendFailed {
                channel: "MAIL".to_string(),
                reason: "模拟邮件发送失败".to_string(),
            });
        }

        let message_id = format!("mail_{}", Uuid::new_v4());

        info!(
            channel = "MAIL",
            notification = notification.name(),
            to = %recipient.email,
            from = %self.config.from_address,
            message_id = %message_id,
            subject = %mail.subject,
            body = %mail.body_text(),
            "模拟发送邮件通知"
        );

        Ok(message_id)
    }
}

#[async_trait]
impl DeliveryChannel for MailChannel {
    fn channel_type(&self) -> Channel {
        Channel::Mail
    }

    fn name(&self) -> &str {
        "Mail"
    }

    async fn is_available(&self, recipient: &User) -> bool {
        if !self.config.enabled {
            warn!(user_id = %recipient.user_id, "邮件渠道已禁用");
            return false;
        }

        // 接收人没有邮箱地址时跳过邮件渠道
        if recipient.email.is_empty() {
            warn!(user_id = %recipient.user_id, "接收人未绑定邮箱，跳过邮件渠道");
            return false;
        }

        true
    }

    async fn deliver(
        &self,
        recipient: &User,
        notification: &dyn OrderNotification,
    ) -> Result<ChannelOutcome> {
        let start = Instant::now();

        if !self.is_available(recipient).await {
            return Ok(ChannelOutcome::skipped(
                self.channel_type(),
                "接收人未绑定邮箱或渠道已禁用",
            ));
        }

        match self.send_mail(recipient, notification).await {
            Ok(message_id) => Ok(ChannelOutcome::success(
                self.channel_type(),
                Some(message_id),
                start.elapsed().as_millis() as u64,
            )),
            Err(e) => Ok(ChannelOutcome::failed(
                self.channel_type(),
                e.to_string(),
                start.elapsed().as_millis() as u64,
            )),
        }
    }
}
