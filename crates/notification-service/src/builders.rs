//! 通知内容构建
//!
//! 每种订单通知对应一个具体类型，实现 `OrderNotification` trait：
//! 渠道集合按类型静态固定，内容渲染是纯函数。
//! 构建时从订单捕获所需字段，渲染阶段不再访问外部状态。

use store_shared::orders::{Order, OrderStatus};

use crate::error::{NotificationError, Result};
use crate::types::{Channel, MailMessage, RecordContent};

/// 订单通知的统一能力接口
///
/// 分发器只依赖此 trait：`channels` 决定投递到哪些渠道，
/// `render_mail` / `render_record` 产出各渠道的内容。
pub trait OrderNotification: Send + Sync {
    /// 通知类型名（用于日志）
    fn name(&self) -> &'static str;

    /// 该通知类型的渠道集合，与订单内容和接收人无关
    fn channels(&self) -> &'static [Channel];

    /// 渲染邮件内容
    fn render_mail(&self) -> MailMessage;

    /// 渲染站内记录内容
    ///
    /// 仅支持站内渠道的通知类型返回 Some，其余类型使用默认实现。
    fn render_record(&self) -> Option<RecordContent> {
        None
    }
}

// ---------------------------------------------------------------------------
// NewOrder — 新订单通知
// ---------------------------------------------------------------------------

/// 新订单通知
///
/// 下单成功后发给店铺运营：邮件提醒处理，同时落一条站内记录
/// 供后台消息中心展示。
pub struct NewOrder {
    order_id: i64,
    /// 后台管理界面基地址，用于拼接订单详情链接
    admin_base_url: String,
}

impl NewOrder {
    pub fn new(order: &Order, admin_base_url: impl Into<String>) -> Self {
        Self {
            order_id: order.order_id(),
            admin_base_url: admin_base_url.into(),
        }
    }
}

impl OrderNotification for NewOrder {
    fn name(&self) -> &'static str {
        "new_order"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::Mail, Channel::Database]
    }

    fn render_mail(&self) -> MailMessage {
        MailMessage::new("New Order Received")
            .line("A new order has been placed.")
            .line(format!("Order ID: #{}", self.order_id))
            .line("Please review and process it.")
            .action(
                "View Order",
                format!("{}/orders/{}", self.admin_base_url, self.order_id),
            )
    }

    fn render_record(&self) -> Option<RecordContent> {
        Some(RecordContent {
            order_id: self.order_id,
            message: format!("New order placed: #{}", self.order_id),
        })
    }
}

// ---------------------------------------------------------------------------
// OrderShipped — 发货通知
// ---------------------------------------------------------------------------

/// 发货通知
///
/// 构建时即要求订单已携带运单号：缺失运单号属于调用方的流程错误，
/// 在这里用类型化错误拦截，而不是渲染出带空值的邮件。
pub struct OrderShipped {
    order_id: i64,
    tracking_id: String,
    /// 物流查询页基地址
    tracking_base_url: String,
}

impl OrderShipped {
    pub fn new(order: &Order, tracking_base_url: impl Into<String>) -> Result<Self> {
        let tracking_id = order
            .tracking_id()
            .ok_or(NotificationError::MissingTracking {
                order_id: order.order_id(),
            })?
            .to_string();

        Ok(Self {
            order_id: order.order_id(),
            tracking_id,
            tracking_base_url: tracking_base_url.into(),
        })
    }
}

impl OrderNotification for OrderShipped {
    fn name(&self) -> &'static str {
        "order_shipped"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::Mail]
    }

    fn render_mail(&self) -> MailMessage {
        MailMessage::new("Your Order Has Shipped")
            .line(format!("Your order #{} has been shipped.", self.order_id))
            .line(format!("Tracking number: {}", self.tracking_id))
            .action(
                "Track Shipment",
                format!("{}/{}", self.tracking_base_url, self.tracking_id),
            )
    }
}

// ---------------------------------------------------------------------------
// OrderStatusUpdated — 状态变更通知
// ---------------------------------------------------------------------------

/// 订单状态变更通知
///
/// 正文只有一句话，嵌入订单当前的状态值。
pub struct OrderStatusUpdated {
    order_id: i64,
    status: OrderStatus,
}

impl OrderStatusUpdated {
    pub fn new(order: &Order) -> Self {
        Self {
            order_id: order.order_id(),
            status: order.status(),
        }
    }
}

impl OrderNotification for OrderStatusUpdated {
    fn name(&self) -> &'static str {
        "order_status_updated"
    }

    fn channels(&self) -> &'static [Channel] {
        &[Channel::Mail]
    }

    fn render_mail(&self) -> MailMessage {
        MailMessage::new("Order Status Updated").line(format!(
            "Your order #{} is now {}.",
            self.order_id, self.status
        ))
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
