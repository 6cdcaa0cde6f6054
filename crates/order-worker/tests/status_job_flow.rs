//! 状态迁移任务端到端流程测试
//!
//! 使用内存仓储和计数邮件渠道验证：状态写入、通知投递次数、
//! 幂等去重以及不同迁移之间互不影响。

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use notification_service::NotificationDispatcher;
use notification_service::builders::OrderNotification;
use notification_service::channels::DeliveryChannel;
use notification_service::error::Result as NotifyResult;
use notification_service::types::{Channel, ChannelOutcome};
use order_worker::consumer::handle_job;
use order_worker::processor::{JobOutcome, OrderStatusProcessor};
use store_shared::jobs::OrderStatusJob;
use store_shared::orders::{InMemoryOrderRepository, OrderRepository, OrderStatus, User};

/// 计数邮件渠道
///
/// 记录投递次数和最近一封邮件的正文，便于断言通知内容与次数。
struct CountingMailChannel {
    sent: AtomicU32,
    last_body: std::sync::Mutex<Option<String>>,
}

impl CountingMailChannel {
    fn new() -> Self {
        Self {
            sent: AtomicU32::new(0),
            last_body: std::sync::Mutex::new(None),
        }
    }

    fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }

    fn last_body(&self) -> Option<String> {
        self.last_body.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeliveryChannel for CountingMailChannel {
    fn channel_type(&self) -> Channel {
        Channel::Mail
    }

    fn name(&self) -> &str {
        "CountingMail"
    }

    async fn is_available(&self, _recipient: &User) -> bool {
        true
    }

    async fn deliver(
        &self,
        _recipient: &User,
        notification: &dyn OrderNotification,
    ) -> NotifyResult<ChannelOutcome> {
        let mail = notification.render_mail();
        self.sent.fetch_add(1, Ordering::SeqCst);
        *self.last_body.lock().unwrap() = Some(mail.body_text());
        Ok(ChannelOutcome::success(Channel::Mail, None, 0))
    }
}

async fn setup() -> (
    Arc<InMemoryOrderRepository>,
    Arc<CountingMailChannel>,
    OrderStatusProcessor,
) {
    let repo = Arc::new(InMemoryOrderRepository::new());
    repo.upsert_user(User {
        user_id: "user-007".to_string(),
        name: "Bob".to_string(),
        email: "bob@example.com".to_string(),
    })
    .await
    .unwrap();

    let mail = Arc::new(CountingMailChannel::new());
    let dispatcher = Arc::new(NotificationDispatcher::new().register(mail.clone() as Arc<dyn DeliveryChannel>));
    let processor = OrderStatusProcessor::new(repo.clone(), dispatcher);

    (repo, mail, processor)
}

#[tokio::test]
async fn test_job_transitions_status_and_dispatches_once() {
    let (repo, mail, processor) = setup().await;
    let order = repo.create("user-007").await.unwrap();

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

    // 恰好一次状态变更通知
    assert_eq!(mail.sent_count(), 1);
    let body = mail.last_body().unwrap();
    assert!(body.contains(&format!(
        "Your order #{} is now processed.",
        order.order_id()
    )));
}

#[tokio::test]
async fn test_same_logical_job_twice_dispatches_once() {
    let (repo, mail, processor) = setup().await;
    let order = repo.create("user-007").await.unwrap();

    // 同一逻辑迁移被投递两次（例如队列重复消费）
    let first = OrderStatusJob::new(order.order_id(), OrderStatus::Processed);
    let second = OrderStatusJob::new(order.order_id(), OrderStatus::Processed);

    handle_job(&processor, &first).await.unwrap();
    let outcome = handle_job(&processor, &second).await.unwrap();

    assert_eq!(outcome, JobOutcome::DuplicateSkipped);
    // 通知只发送一次
    assert_eq!(mail.sent_count(), 1);
}

#[tokio::test]
async fn test_distinct_transitions_each_dispatch() {
    let (repo, mail, processor) = setup().await;
    let order = repo.create("user-007").await.unwrap();

    let to_processed = OrderStatusJob::new(order.order_id(), OrderStatus::Processed);
    handle_job(&processor, &to_processed).await.unwrap();

    let to_shipped = OrderStatusJob::new(order.order_id(), OrderStatus::Shipped);
    handle_job(&processor, &to_shipped).await.unwrap();

    // 两次不同的迁移各自投递一次通知
    assert_eq!(mail.sent_count(), 2);

    let body = mail.last_body().unwrap();
    assert!(body.contains(&format!(
        "Your order #{} is now shipped.",
        order.order_id()
    )));
}

#[tokio::test]
async fn test_missing_order_is_permanent_failure() {
    let (_repo, mail, processor) = setup().await;

    let job = OrderStatusJob::new(12345, OrderStatus::Processed);
    let result = handle_job(&processor, &job).await;

    assert!(result.is_err());
    assert_eq!(mail.sent_count(), 0);
}
