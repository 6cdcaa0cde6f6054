//! 订单领域模型与仓储抽象
//!
//! 订单的状态字段只能通过 `OrderRepository::update_status` 变更，
//! 该方法要求调用方携带读取时的版本号做乐观并发校验，
//! 防止多个 worker 同时处理同一订单时丢失更新。

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// OrderStatus — 订单状态
// ---------------------------------------------------------------------------

/// 订单状态
///
/// 序列化与展示统一使用小写形式，通知正文直接嵌入该字符串。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processed => "processed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// User — 通知接收人
// ---------------------------------------------------------------------------

/// 订单归属用户
///
/// 通知投递只需要基本的身份与联系方式字段，
/// 完整的会员资料由账户系统持有。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: String,
    pub name: String,
    pub email: String,
}

// ---------------------------------------------------------------------------
// Order — 订单
// ---------------------------------------------------------------------------

/// 订单
///
/// 字段保持私有，外部只读访问；`status` 与 `version` 的变更
/// 必须经由仓储的状态迁移方法完成。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    order_id: i64,
    user_id: String,
    status: OrderStatus,
    /// 运单号，发货前由物流环节写入
    tracking_id: Option<String>,
    /// 乐观并发版本号，每次写入递增
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// 创建新订单，初始状态为 pending
    pub fn new(order_id: i64, user_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            order_id,
            user_id: user_id.into(),
            status: OrderStatus::Pending,
            tracking_id: None,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn order_id(&self) -> i64 {
        self.order_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn tracking_id(&self) -> Option<&str> {
        self.tracking_id.as_deref()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// 状态迁移，仅供仓储实现调用
    ///
    /// 版本号随状态一并递增，确保并发写入者的版本校验能察觉变化。
    pub fn apply_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// 写入运单号，仅供仓储实现调用
    pub fn apply_tracking(&mut self, tracking_id: impl Into<String>) {
        self.tracking_id = Some(tracking_id.into());
        self.version += 1;
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// OrderRepository — 仓储抽象
// ---------------------------------------------------------------------------

/// 订单仓储
///
/// 真实部署中由数据库实现；本仓库提供内存实现用于开发与测试。
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// 为指定用户创建订单并分配订单号
    async fn create(&self, user_id: &str) -> Result<Order>;

    /// 按订单号查询
    async fn find(&self, order_id: i64) -> Result<Option<Order>>;

    /// 写入运单号
    async fn set_tracking(&self, order_id: i64, tracking_id: &str) -> Result<Order>;

    /// 乐观并发的状态迁移
    ///
    /// `expected_version` 为调用方读取订单时的版本号，
    /// 与当前版本不一致时返回 `VersionConflict`，由调用方重新读取后重试。
    async fn update_status(
        &self,
        order_id: i64,
        expected_version: u64,
        status: OrderStatus,
    ) -> Result<Order>;

    /// 查询订单归属用户
    async fn find_user(&self, user_id: &str) -> Result<Option<User>>;

    /// 写入或更新用户资料
    async fn upsert_user(&self, user: User) -> Result<()>;
}

// ---------------------------------------------------------------------------
// InMemoryOrderRepository — 内存实现
// ---------------------------------------------------------------------------

/// 基于 DashMap 的内存订单仓储
///
/// 适用于开发和测试环境。DashMap 的分片锁保证单个订单的
/// 读改写在 `update_status` 内是原子的，版本校验因此可靠。
#[derive(Debug)]
pub struct InMemoryOrderRepository {
    orders: DashMap<i64, Order>,
    users: DashMap<String, User>,
    next_id: AtomicI64,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self {
            orders: DashMap::new(),
            users: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }

    /// 当前订单总数
    pub fn order_count(&self) -> usize {
        self.orders.len()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn create(&self, user_id: &str) -> Result<Order> {
        let order_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let order = Order::new(order_id, user_id);
        self.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn find(&self, order_id: i64) -> Result<Option<Order>> {
        Ok(self.orders.get(&order_id).map(|o| o.clone()))
    }

    async fn set_tracking(&self, order_id: i64, tracking_id: &str) -> Result<Order> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            })?;

        entry.apply_tracking(tracking_id);
        Ok(entry.clone())
    }

    async fn update_status(
        &self,
        order_id: i64,
        expected_version: u64,
        status: OrderStatus,
    ) -> Result<Order> {
        let mut entry = self
            .orders
            .get_mut(&order_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "Order".to_string(),
                id: order_id.to_string(),
            })?;

        if entry.version() != expected_version {
            return Err(StoreError::VersionConflict {
                entity: "Order".to_string(),
                id: order_id.to_string(),
                expected: expected_version,
                actual: entry.version(),
            });
        }

        entry.apply_status(status);
        Ok(entry.clone())
    }

    async fn find_user(&self, user_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(user_id).map(|u| u.clone()))
    }

    async fn upsert_user(&self, user: User) -> Result<()> {
        self.users.insert(user.user_id.clone(), user);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_display() {
        assert_eq!(OrderStatus::Pending.to_string(), "pending");
        assert_eq!(OrderStatus::Processed.to_string(), "processed");
        assert_eq!(OrderStatus::Shipped.to_string(), "shipped");
        assert_eq!(OrderStatus::Delivered.to_string(), "delivered");
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
    }

    #[test]
    fn test_order_status_serialization() {
        let json = serde_json::to_string(&OrderStatus::Shipped).unwrap();
        assert_eq!(json, r#""shipped""#);

        let parsed: OrderStatus = serde_json::from_str(r#""processed""#).unwrap();
        assert_eq!(parsed, OrderStatus::Processed);
    }

    #[test]
    fn test_order_new_defaults() {
        let order = Order::new(1, "user-001");
        assert_eq!(order.order_id(), 1);
        assert_eq!(order.user_id(), "user-001");
        assert_eq!(order.status(), OrderStatus::Pending);
        assert!(order.tracking_id().is_none());
        assert_eq!(order.version(), 0);
    }

    #[test]
    fn test_apply_status_bumps_version() {
        let mut order = Order::new(1, "user-001");
        order.apply_status(OrderStatus::Processed);
        assert_eq!(order.status(), OrderStatus::Processed);
        assert_eq!(order.version(), 1);

        order.apply_status(OrderStatus::Shipped);
        assert_eq!(order.version(), 2);
    }

    #[tokio::test]
    async fn test_repository_create_assigns_ids() {
        let repo = InMemoryOrderRepository::new();

        let first = repo.create("user-001").await.unwrap();
        let second = repo.create("user-002").await.unwrap();

        assert_ne!(first.order_id(), second.order_id());
        assert_eq!(repo.order_count(), 2);
    }

    #[tokio::test]
    async fn test_repository_update_status() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.create("user-001").await.unwrap();

        let updated = repo
            .update_status(order.order_id(), order.version(), OrderStatus::Processed)
            .await
            .unwrap();

        assert_eq!(updated.status(), OrderStatus::Processed);
        assert_eq!(updated.version(), order.version() + 1);
    }

    #[tokio::test]
    async fn test_repository_update_status_version_conflict() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.create("user-001").await.unwrap();

        // 第一次更新成功，版本号递增
        repo.update_status(order.order_id(), order.version(), OrderStatus::Processed)
            .await
            .unwrap();

        // 使用过期的版本号再次更新，应返回版本冲突
        let result = repo
            .update_status(order.order_id(), order.version(), OrderStatus::Shipped)
            .await;

        assert!(matches!(
            result,
            Err(StoreError::VersionConflict { expected: 0, actual: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_repository_update_status_not_found() {
        let repo = InMemoryOrderRepository::new();
        let result = repo.update_status(999, 0, OrderStatus::Processed).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_repository_set_tracking() {
        let repo = InMemoryOrderRepository::new();
        let order = repo.create("user-001").await.unwrap();

        let updated = repo
            .set_tracking(order.order_id(), "TRK-20250115-001")
            .await
            .unwrap();

        assert_eq!(updated.tracking_id(), Some("TRK-20250115-001"));
        // 写入运单号同样递增版本，使并发的状态迁移能察觉
        assert_eq!(updated.version(), order.version() + 1);
    }

    #[tokio::test]
    async fn test_repository_users() {
        let repo = InMemoryOrderRepository::new();

        repo.upsert_user(User {
            user_id: "user-001".to_string(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
        })
        .await
        .unwrap();

        let user = repo.find_user("user-001").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");

        assert!(repo.find_user("missing").await.unwrap().is_none());
    }
}
