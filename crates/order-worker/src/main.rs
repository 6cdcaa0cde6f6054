//! 订单状态 worker 入口
//!
//! 装配仓储、通知分发器、死信生产者与 Kafka 消费者，
//! 监听 ctrl-c 信号优雅退出。

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info};

use notification_service::NotificationDispatcher;
use notification_service::channels::{DatabaseChannel, MailChannel, MailerConfig};
use notification_service::store::InMemoryNotificationStore;
use order_worker::consumer::JobConsumer;
use order_worker::processor::OrderStatusProcessor;
use store_shared::config::AppConfig;
use store_shared::dlq::DlqProducer;
use store_shared::kafka::KafkaProducer;
use store_shared::orders::InMemoryOrderRepository;
use store_shared::retry::RetryPolicy;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("order-worker").unwrap_or_default();
    store_shared::observability::init("order-worker", &config.observability)?;

    info!(
        environment = %config.environment,
        brokers = %config.kafka.brokers,
        "order-worker 启动中"
    );

    // 订单仓储：内存实现用于演示环境，生产部署替换为数据库实现
    let orders = Arc::new(InMemoryOrderRepository::new());

    // 通知分发器：邮件 + 站内记录
    let notification_store = Arc::new(InMemoryNotificationStore::new());
    let dispatcher = Arc::new(
        NotificationDispatcher::new()
            .register(Arc::new(MailChannel::new(MailerConfig {
                enabled: true,
                from_address: config.notify.mail_from_address.clone(),
                from_name: config.notify.mail_from_name.clone(),
            })))
            .register(Arc::new(DatabaseChannel::new(notification_store))),
    );

    let processor = Arc::new(OrderStatusProcessor::new(orders, dispatcher));

    let producer = KafkaProducer::new(&config.kafka)?;
    let dlq = Arc::new(DlqProducer::new(
        producer,
        "order-worker",
        RetryPolicy::default(),
    ));

    let consumer = JobConsumer::new(&config, processor, dlq)?;

    // 优雅关闭：ctrl-c 后通知消费循环退出
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "监听 ctrl-c 信号失败");
            return;
        }
        info!("收到 ctrl-c，开始优雅关闭");
        let _ = shutdown_tx.send(true);
    });

    consumer.run(shutdown_rx).await?;

    info!("order-worker 已退出");
    Ok(())
}
