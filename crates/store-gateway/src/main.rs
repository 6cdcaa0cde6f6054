//! 网关入口
//!
//! 装配仓储、通知分发器、任务队列、策略注册表与 CORS 层，
//! 启动 axum 服务并监听 ctrl-c 优雅退出。

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use notification_service::NotificationDispatcher;
use notification_service::channels::{DatabaseChannel, MailChannel, MailerConfig};
use notification_service::store::InMemoryNotificationStore;
use store_fixtures::seed;
use store_gateway::cors::CorsConfig;
use store_gateway::policy::PolicyRegistry;
use store_gateway::routes;
use store_gateway::state::AppState;
use store_shared::config::AppConfig;
use store_shared::jobs::KafkaJobQueue;
use store_shared::kafka::KafkaProducer;
use store_shared::orders::InMemoryOrderRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load("store-gateway").unwrap_or_default();
    store_shared::observability::init("store-gateway", &config.observability)?;

    info!(
        environment = %config.environment,
        addr = %config.server_addr(),
        "store-gateway 启动中"
    );

    // 订单仓储：内存实现用于演示环境，生产部署替换为数据库实现
    let orders = Arc::new(InMemoryOrderRepository::new());

    // 非生产环境预置演示用户与订单
    if !config.is_production() {
        let stats = seed::seed_demo_data(orders.as_ref()).await?;
        info!(
            users = stats.users,
            orders = stats.orders,
            "演示数据已预置"
        );
    } else {
        warn!("生产环境使用内存订单仓储，重启后数据丢失");
    }

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

    // 状态迁移任务经 Kafka 入队，由 order-worker 消费
    let producer = KafkaProducer::new(&config.kafka)?;
    let jobs = Arc::new(KafkaJobQueue::new(producer));

    // 策略注册表：启动时构建一次，之后只读
    let policies = Arc::new(PolicyRegistry::with_defaults());

    let state = AppState {
        orders,
        dispatcher,
        jobs,
        policies,
        notify: config.notify.clone(),
    };

    // CORS：默认值即对外契约，静态资源路径由对象存储/反向代理服务，
    // 网关只对挂载的 /api 前缀应用该层
    let cors = CorsConfig::default();

    let app = Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors.to_layer())
        .with_state(state);

    let listener = TcpListener::bind(config.server_addr()).await?;
    info!(addr = %config.server_addr(), "store-gateway 已就绪");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("收到 ctrl-c，开始优雅关闭");
        })
        .await?;

    info!("store-gateway 已退出");
    Ok(())
}
