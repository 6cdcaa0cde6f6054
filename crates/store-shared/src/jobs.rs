//! 队列任务模型与入队抽象
//!
//! 定义订单状态迁移任务的信封格式。重试次数、退避参数和幂等键
//! 都是任务声明的一部分，随消息一起入队，而非依赖执行端的运行时默认值。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::kafka::{KafkaProducer, topics};
use crate::orders::OrderStatus;
use crate::retry::RetryPolicy;

// ---------------------------------------------------------------------------
// JobRetryConfig — 任务自带的重试配置
// ---------------------------------------------------------------------------

/// 任务重试配置
///
/// 可序列化的退避参数，入队时写入任务信封，
/// 执行端据此构造 `RetryPolicy`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for JobRetryConfig {
    /// 默认：最多重试 3 次，初始退避 1 秒，上限 30 秒，倍数 2.0
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 1_000,
            max_delay_ms: 30_000,
            multiplier: 2.0,
        }
    }
}

impl JobRetryConfig {
    /// 转换为执行端使用的重试策略
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
        }
    }
}

// ---------------------------------------------------------------------------
// OrderStatusJob — 订单状态迁移任务
// ---------------------------------------------------------------------------

/// 订单状态迁移任务
///
/// 入队时捕获订单号和目标状态；worker 执行时完成状态写入并
/// 向订单归属用户投递状态变更通知。
///
/// `idempotency_key` 由订单号与目标状态派生，同一逻辑迁移
/// 不论被投递多少次，通知只发送一次。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusJob {
    /// 任务唯一标识（UUID v7），时间有序便于排查
    pub job_id: String,
    pub order_id: i64,
    /// 本次迁移的目标状态，入队方固定
    pub target_status: OrderStatus,
    /// 幂等键，重复投递时用于去重
    pub idempotency_key: String,
    pub retry: JobRetryConfig,
    pub enqueued_at: DateTime<Utc>,
}

impl OrderStatusJob {
    /// 构建新任务，自动生成任务 ID 和幂等键
    pub fn new(order_id: i64, target_status: OrderStatus) -> Self {
        Self {
            job_id: Uuid::now_v7().to_string(),
            order_id,
            target_status,
            idempotency_key: format!("order-{}:{}", order_id, target_status),
            retry: JobRetryConfig::default(),
            enqueued_at: Utc::now(),
        }
    }

    /// 覆盖重试配置
    pub fn with_retry(mut self, retry: JobRetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

// ---------------------------------------------------------------------------
// JobQueue — 入队抽象
// ---------------------------------------------------------------------------

/// 任务入队接口
///
/// 网关通过此 trait 入队，具体的队列后端（Kafka 或测试用内存队列）
/// 在装配时注入。
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &OrderStatusJob) -> Result<()>;
}

/// 基于 Kafka 的任务队列
pub struct KafkaJobQueue {
    producer: KafkaProducer,
}

impl KafkaJobQueue {
    pub fn new(producer: KafkaProducer) -> Self {
        Self { producer }
    }
}

#[async_trait]
impl JobQueue for KafkaJobQueue {
    async fn enqueue(&self, job: &OrderStatusJob) -> Result<()> {
        // 以订单号作为消息 key，同一订单的任务落在同一分区保持顺序
        self.producer
            .send_json(topics::ORDER_STATUS_JOBS, &job.order_id.to_string(), job)
            .await?;
        Ok(())
    }
}

/// 内存任务队列
///
/// 用于测试和本地开发，入队的任务保存在进程内，
/// 可通过 `drain` 取出检查。
#[derive(Debug, Default)]
pub struct InMemoryJobQueue {
    jobs: std::sync::Mutex<Vec<OrderStatusJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出当前积压的全部任务
    pub fn drain(&self) -> Vec<OrderStatusJob> {
        let mut guard = self.jobs.lock().expect("任务队列锁中毒");
        guard.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().expect("任务队列锁中毒").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: &OrderStatusJob) -> Result<()> {
        self.jobs
            .lock()
            .map_err(|_| StoreError::Internal("任务队列锁中毒".to_string()))?
            .push(job.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------
