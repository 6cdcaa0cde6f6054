//! 通知服务错误类型
//!
//! 定义内容构建、渠道投递和站内记录写入等场景的错误分类，
//! 便于上层根据错误类型决定重试或丢弃策略。

use thiserror::Error;

use store_shared::error::StoreError;

#[derive(Debug, Error)]
pub enum NotificationError {
    /// 发货通知要求订单已携带运单号，缺失时在构建阶段报错
    /// 而不是渲染出带空值的内容
    #[error("订单缺少运单号，无法构建发货通知: order_id={order_id}")]
    MissingTracking { order_id: i64 },

    #[error("通知投递失败: 渠道={channel}, 原因={reason}")]
    SendFailed { channel: String, reason: String },

    #[error("站内通知写入失败: {0}")]
    RecordStore(String),

    #[error(transparent)]
    Shared(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, NotificationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let missing = NotificationError::MissingTracking { order_id: 42 };
        assert_eq!(
            missing.to_string(),
            "订单缺少运单号，无法构建发货通知: order_id=42"
        );

        let send_err = NotificationError::SendFailed {
            channel: "MAIL".to_string(),
            reason: "SMTP 超时".to_string(),
        };
        assert_eq!(send_err.to_string(), "通知投递失败: 渠道=MAIL, 原因=SMTP 超时");
    }
}
