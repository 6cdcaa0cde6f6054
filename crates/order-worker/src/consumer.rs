//! 任务消费者
//!
//! 从 Kafka 消费订单状态迁移任务，按任务自带的重试配置执行，
//! 重试耗尽或永久失败的任务投递到死信队列。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use store_shared::config::AppConfig;
use store_shared::dlq::DlqProducer;
use store_shared::jobs::OrderStatusJob;
use store_shared::kafka::{ConsumerMessage, KafkaConsumer, topics};
use store_shared::retry::retry_with_policy;

use crate::error::WorkerError;
use crate::processor::{JobOutcome, OrderStatusProcessor};

/// 任务消费者
///
/// 封装 Kafka 消费循环；单条消息的处理失败只记录日志并走死信路径，
/// 不会中断整个消费者。
pub struct JobConsumer {
    consumer: KafkaConsumer,
    processor: Arc<OrderStatusProcessor>,
    dlq: Arc<DlqProducer>,
}

impl JobConsumer {
    pub fn new(
        config: &AppConfig,
        processor: Arc<OrderStatusProcessor>,
        dlq: Arc<DlqProducer>,
    ) -> Result<Self, WorkerError> {
        let consumer = KafkaConsumer::new(&config.kafka, Some("status-jobs"))?;
        Ok(Self {
            consumer,
            processor,
            dlq,
        })
    }

    /// 启动消费循环，直到收到 shutdown 信号
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> Result<(), WorkerError> {
        self.consumer.subscribe(&[topics::ORDER_STATUS_JOBS])?;

        info!(topic = topics::ORDER_STATUS_JOBS, "任务消费者已启动");

        let processor = self.processor;
        let dlq = self.dlq;

        self.consumer
            .start(shutdown, |msg| {
                let processor = &processor;
                let dlq = &dlq;
                async move {
                    if let Err(e) = handle_message(processor, dlq, &msg).await {
                        error!(
                            error = %e,
                            topic = %msg.topic,
                            partition = msg.partition,
                            offset = msg.offset,
                            "处理任务消息失败"
                        );
                    }
                    Ok(())
                }
            })
            .await;

        info!("任务消费者已停止");
        Ok(())
    }
}

/// 处理单条 Kafka 任务消息
///
/// 拆分为独立函数而非方法，便于在测试中直接调用而无需构造完整的 Consumer。
async fn handle_message(
    processor: &OrderStatusProcessor,
    dlq: &DlqProducer,
    msg: &ConsumerMessage,
) -> Result<(), WorkerError> {
    let job: OrderStatusJob = msg
        .deserialize_payload()
        .map_err(|e| WorkerError::DeserializationFailed(e.to_string()))?;

    info!(
        job_id = %job.job_id,
        order_id = job.order_id,
        target_status = %job.target_status,
        "收到状态迁移任务"
    );

    match handle_job(processor, &job).await {
        Ok(outcome) => {
            info!(job_id = %job.job_id, ?outcome, "任务处理完成");
        }
        Err(e) => {
            error!(job_id = %job.job_id, error = %e, "任务处理失败，投递到死信队列");
            dlq.send_job_to_dlq(&job, &e.to_string()).await?;
        }
    }

    Ok(())
}

/// 按任务自带的重试配置执行任务
///
/// 仅瞬时错误（存储、投递）参与重试；永久失败（订单不存在等）
/// 立即返回，由调用方走死信路径。
pub async fn handle_job(
    processor: &OrderStatusProcessor,
    job: &OrderStatusJob,
) -> Result<JobOutcome, WorkerError> {
    let policy = job.retry.to_policy();

    retry_with_policy(
        &policy,
        "order_status_job",
        WorkerError::is_retryable,
        || processor.execute(job),
    )
    .await
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use notification_service::NotificationDispatcher;
    use notification_service::channels::MailChannel;
    use store_shared::jobs::JobRetryConfig;
    use store_shared::orders::{InMemoryOrderRepository, OrderRepository, OrderStatus, User};

    async fn setup() -> (Arc<InMemoryOrderRepository>, OrderStatusProcessor) {
        let repo = Arc::new(InMemoryOrderRepository::new());
        repo.upsert_user(User {
            user_id: "user-001".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await
        .unwrap();

        let dispatcher = Arc::new(
            NotificationDispatcher::new().register(Arc::new(MailChannel::with_defaults())),
        );
        let processor = OrderStatusProcessor::new(repo.clone(), dispatcher);
        (repo, processor)
    }

    /// 构造测试用的 Kafka 消息
    fn make_message(job: &OrderStatusJob) -> ConsumerMessage {
        ConsumerMessage {
            topic: topics::ORDER_STATUS_JOBS.to_string(),
            partition: 0,
            offset: 1,
            key: Some(job.order_id.to_string()),
            payload: serde_json::to_vec(job).expect("序列化测试任务失败"),
            timestamp: None,
            headers: HashMap::new(),
        }
    }

    #[test]
    fn test_job_message_round_trip() {
        let job = OrderStatusJob::new(42, OrderStatus::Processed);
        let msg = make_message(&job);

        let deserialized: OrderStatusJob = msg.deserialize_payload().unwrap();
        assert_eq!(deserialized.job_id, job.job_id);
        assert_eq!(deserialized.order_id, 42);
        assert_eq!(deserialized.target_status, OrderStatus::Processed);
        assert_eq!(deserialized.idempotency_key, job.idempotency_key);
    }

    #[test]
    fn test_invalid_payload_fails_deserialization() {
        let msg = ConsumerMessage {
            topic: topics::ORDER_STATUS_JOBS.to_string(),
            partition: 0,
            offset: 0,
            key: None,
            payload: b"not valid json".to_vec(),
            timestamp: None,
            headers: HashMap::new(),
        };

        let result: Result<OrderStatusJob, _> = msg.deserialize_payload();
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_handle_job_executes_transition() {
        let (repo, processor) = setup().await;
        let order = repo.create("user-001").await.unwrap();

        let job = OrderStatusJob::new(order.order_id(), OrderStatus::Processed);
        let outcome = handle_job(&processor, &job).await.unwrap();

        assert_eq!(
            outcome,
            JobOutcome::Completed {
                status_changed: true
            }
        );
        let updated = repo.find(order.order_id()).await.unwrap().unwrap();
        assert_eq!(updated.status(), OrderStatus::Processed);
    }

    #[tokio::test]
    async fn test_handle_job_permanent_failure_not_retried() {
        let (_repo, processor) = setup().await;

        // 使用极短退避，即便误触重试也不会拖慢测试
        let job = OrderStatusJob::new(999, OrderStatus::Processed).with_retry(JobRetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 5,
            multiplier: 2.0,
        });

        let err = handle_job(&processor, &job).await.unwrap_err();
        assert!(matches!(err, WorkerError::OrderNotFound { order_id: 999 }));
    }
}
