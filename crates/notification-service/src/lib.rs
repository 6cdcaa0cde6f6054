//! 订单通知服务
//!
//! 将订单生命周期事件（下单、发货、状态变更）映射为渠道化的通知内容，
//! 并通过邮件渠道和站内记录渠道投递。
//!
//! # 主要模块
//!
//! - `builders`: 各通知类型的内容构建（纯函数，无副作用）
//! - `channels`: 投递渠道抽象与邮件/站内实现
//! - `dispatcher`: 多渠道并行分发
//! - `store`: 站内通知的持久化抽象

pub mod builders;
pub mod channels;
pub mod dispatcher;
pub mod error;
pub mod store;
pub mod types;

pub use builders::{NewOrder, OrderNotification, OrderShipped, OrderStatusUpdated};
pub use dispatcher::NotificationDispatcher;
pub use types::Channel;
