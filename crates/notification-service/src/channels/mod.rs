//! 通知投递渠道实现
//!
//! 定义投递渠道 trait 并提供邮件与站内记录两种实现。
//!
//! ## 支持的渠道
//!
//! - **Mail**: 邮件通知（当前为模拟发送，生产环境接入 SMTP 或邮件服务商）
//! - **Database**: 站内记录（写入通知存储，供应用内消息中心展示）

mod database;
mod mail;

pub use database::DatabaseChannel;
pub use mail::{MailChannel, MailerConfig};

use async_trait::async_trait;

use store_shared::orders::User;

use crate::builders::OrderNotification;
use crate::error::Result;
use crate::types::{Channel, ChannelOutcome};

/// 投递渠道 trait
///
/// 所有渠道都需要实现此 trait，提供统一的投递接口。
/// 渠道实现应当是无状态或内部同步的，便于并发调用。
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// 渠道类型标识
    fn channel_type(&self) -> Channel;

    /// 渠道名称（用于日志）
    fn name(&self) -> &str;

    /// 检查渠道对该接收人是否可用
    ///
    /// 投递前调用，例如接收人没有邮箱地址时邮件渠道应返回 false。
    async fn is_available(&self, recipient: &User) -> bool;

    /// 投递通知
    ///
    /// 投递失败返回 `ChannelOutcome::failed` 而非 Err，
    /// 以便调用方区分"单渠道失败"和"渠道本身异常"。
    async fn deliver(
        &self,
        recipient: &User,
        notification: &dyn OrderNotification,
    ) -> Result<ChannelOutcome>;
}
