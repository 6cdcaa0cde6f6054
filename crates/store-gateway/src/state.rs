//! 网关共享状态
//!
//! 仓储、通知分发器、任务队列和策略注册表在启动时装配一次，
//! 通过 axum 的 State 注入到各 handler。

use std::sync::Arc;

use notification_service::NotificationDispatcher;
use store_shared::config::NotifyConfig;
use store_shared::jobs::JobQueue;
use store_shared::orders::OrderRepository;

use crate::policy::PolicyRegistry;

#[derive(Clone)]
pub struct AppState {
    pub orders: Arc<dyn OrderRepository>,
    pub dispatcher: Arc<NotificationDispatcher>,
    pub jobs: Arc<dyn JobQueue>,
    pub policies: Arc<PolicyRegistry>,
    pub notify: NotifyConfig,
}
