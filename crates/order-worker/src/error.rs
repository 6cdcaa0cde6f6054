//! worker 错误类型
//!
//! 区分永久失败（订单不存在、消息损坏）与瞬时失败（存储、投递），
//! 上层据此决定重试还是直接进入死信队列。

use thiserror::Error;

use store_shared::error::StoreError;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("订单未找到: order_id={order_id}")]
    OrderNotFound { order_id: i64 },

    #[error("订单归属用户未找到: user_id={user_id}")]
    OwnerNotFound { user_id: String },

    #[error("任务反序列化失败: {0}")]
    DeserializationFailed(String),

    #[error("通知分发失败: {0}")]
    Dispatch(String),

    #[error(transparent)]
    Shared(#[from] StoreError),
}

impl WorkerError {
    /// 是否为可重试错误
    ///
    /// 订单/用户缺失和消息损坏是永久失败，重试不会改变结果；
    /// 存储与投递失败视为瞬时故障。
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Shared(e) => e.is_retryable(),
            Self::Dispatch(_) => true,
            Self::OrderNotFound { .. }
            | Self::OwnerNotFound { .. }
            | Self::DeserializationFailed(_) => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(!WorkerError::OrderNotFound { order_id: 1 }.is_retryable());
        assert!(
            !WorkerError::OwnerNotFound {
                user_id: "u-1".to_string()
            }
            .is_retryable()
        );
        assert!(!WorkerError::DeserializationFailed("bad json".to_string()).is_retryable());
        assert!(WorkerError::Dispatch("邮件渠道失败".to_string()).is_retryable());
        assert!(WorkerError::Shared(StoreError::Storage("写入失败".to_string())).is_retryable());
        assert!(!WorkerError::Shared(StoreError::Unauthorized).is_retryable());
    }
}
