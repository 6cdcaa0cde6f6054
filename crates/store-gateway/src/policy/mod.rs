//! 授权策略注册表
//!
//! 每种受保护的实体类型绑定一个策略对象，注册表在启动时构建一次，
//! 之后只读，通过 Arc 注入到需要做授权判断的位置。
//!
//! ## 设计说明
//!
//! - 注册表采用 HashMap 存储策略实例，以 EntityKind 为 key 进行路由
//! - 未注册的实体类型一律拒绝，缺失的注册不会扩大访问面
//! - admin 角色短路放行，与各策略的细粒度判断解耦

mod policies;

pub use policies::{CategoryPolicy, CouponPolicy, MediaPolicy, OrderPolicy, ProductPolicy};

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Actor — 请求主体
// ---------------------------------------------------------------------------

/// 请求主体
///
/// 由上游认证中间件注入的身份信息，这里只消费不验证。
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles,
        }
    }

    /// admin 角色拥有所有权限
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == "admin")
    }
}

// ---------------------------------------------------------------------------
// PolicyAction / EntityKind
// ---------------------------------------------------------------------------

/// 受策略约束的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolicyAction {
    ViewAny,
    View,
    Create,
    Update,
    Delete,
}

/// 受保护的实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Category,
    Product,
    Order,
    Media,
    Coupon,
}

// ---------------------------------------------------------------------------
// Policy trait
// ---------------------------------------------------------------------------

/// 实体策略
///
/// 决定请求主体能否对某类实体执行指定操作。
/// `owner_id` 为资源归属者（如订单归属用户），无归属概念的资源传 None。
pub trait Policy: Send + Sync {
    /// 该策略绑定的实体类型
    fn entity_kind(&self) -> EntityKind;

    fn allows(&self, actor: &Actor, action: PolicyAction, owner_id: Option<&str>) -> bool;
}

// ---------------------------------------------------------------------------
// PolicyRegistry
// ---------------------------------------------------------------------------

/// 策略注册表
///
/// 启动时构建一次，之后不可变。每种实体类型恰好一个策略。
pub struct PolicyRegistry {
    policies: HashMap<EntityKind, Arc<dyn Policy>>,
}

impl PolicyRegistry {
    /// 创建空的注册表
    pub fn new() -> Self {
        Self {
            policies: HashMap::new(),
        }
    }

    /// 注册一个策略
    ///
    /// 策略按其 `entity_kind()` 索引；同类型重复注册时后者替换前者。
    pub fn register(&mut self, policy: Arc<dyn Policy>) -> &mut Self {
        let kind = policy.entity_kind();
        debug!(entity_kind = ?kind, "注册授权策略");
        self.policies.insert(kind, policy);
        self
    }

    /// 创建包含全部默认策略的注册表
    ///
    /// 默认绑定：Category、Product、Order、Media、Coupon 各一个策略。
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry
            .register(Arc::new(CategoryPolicy))
            .register(Arc::new(ProductPolicy))
            .register(Arc::new(OrderPolicy))
            .register(Arc::new(MediaPolicy))
            .register(Arc::new(CouponPolicy));

        info!(
            policy_count = registry.len(),
            kinds = ?registry.registered_kinds(),
            "授权策略注册表初始化完成"
        );

        registry
    }

    /// 授权判断
    ///
    /// 委托给实体类型绑定的策略；未注册的类型一律拒绝。
    pub fn check(
        &self,
        kind: EntityKind,
        actor: &Actor,
        action: PolicyAction,
        owner_id: Option<&str>,
    ) -> bool {
        match self.policies.get(&kind) {
            Some(policy) => policy.allows(actor, action, owner_id),
            // 默认拒绝：缺失的注册不会扩大访问面
            None => false,
        }
    }

    pub fn contains(&self, kind: EntityKind) -> bool {
        self.policies.contains_key(&kind)
    }

    pub fn registered_kinds(&self) -> Vec<EntityKind> {
        self.policies.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }
}

impl Default for PolicyRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ---------------------------------------------------------------------------
// 单元测试
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Actor {
        Actor::new("admin-001", vec!["admin".to_string()])
    }

    fn customer(user_id: &str) -> Actor {
        Actor::new(user_id, vec!["customer".to_string()])
    }

    #[test]
    fn test_registry_with_defaults_has_all_kinds() {
        let registry = PolicyRegistry::with_defaults();

        assert_eq!(registry.len(), 5);
        assert!(registry.contains(EntityKind::Category));
        assert!(registry.contains(EntityKind::Product));
        assert!(registry.contains(EntityKind::Order));
        assert!(registry.contains(EntityKind::Media));
        assert!(registry.contains(EntityKind::Coupon));
    }

    #[test]
    fn test_each_kind_routes_to_its_policy() {
        let registry = PolicyRegistry::with_defaults();
        let actor = admin();

        // admin 对每种已注册类型的写操作都被放行
        for kind in [
            EntityKind::Category,
            EntityKind::Product,
            EntityKind::Order,
            EntityKind::Media,
            EntityKind::Coupon,
        ] {
            assert!(
                registry.check(kind, &actor, PolicyAction::Update, None),
                "admin 应能更新 {kind:?}"
            );
        }
    }

    #[test]
    fn test_empty_registry_denies_everything() {
        let registry = PolicyRegistry::new();
        assert!(registry.is_empty());

        // 未注册类型默认拒绝，重复调用结果一致
        for _ in 0..3 {
            assert!(!registry.check(EntityKind::Order, &admin(), PolicyAction::View, None));
        }
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = PolicyRegistry::new();
        registry.register(Arc::new(OrderPolicy));
        registry.register(Arc::new(OrderPolicy));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_actor_is_admin() {
        assert!(admin().is_admin());
        assert!(!customer("user-001").is_admin());
    }

    #[test]
    fn test_owner_can_view_own_order() {
        let registry = PolicyRegistry::with_defaults();
        let actor = customer("user-001");

        assert!(registry.check(
            EntityKind::Order,
            &actor,
            PolicyAction::View,
            Some("user-001")
        ));
        // 他人的订单不可见
        assert!(!registry.check(
            EntityKind::Order,
            &actor,
            PolicyAction::View,
            Some("user-002")
        ));
    }

    #[test]
    fn test_catalog_writes_require_admin() {
        let registry = PolicyRegistry::with_defaults();
        let actor = customer("user-001");

        assert!(registry.check(EntityKind::Product, &actor, PolicyAction::View, None));
        assert!(!registry.check(EntityKind::Product, &actor, PolicyAction::Create, None));
        assert!(!registry.check(EntityKind::Coupon, &actor, PolicyAction::Delete, None));
    }
}
