//! 各实体类型的具体策略
//!
//! 商品目录类实体（分类、商品、媒体、优惠券）对所有人可见，写操作仅限
//! admin；订单归属用户可查看自己的订单，登录用户可下单，其余写操作
//! 仅限 admin。

use super::{Actor, EntityKind, Policy, PolicyAction};

/// 目录类实体的通用判断：读公开，写仅限 admin
fn catalog_allows(actor: &Actor, action: PolicyAction) -> bool {
    match action {
        PolicyAction::ViewAny | PolicyAction::View => true,
        PolicyAction::Create | PolicyAction::Update | PolicyAction::Delete => actor.is_admin(),
    }
}

/// 商品分类策略
pub struct CategoryPolicy;

impl Policy for CategoryPolicy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Category
    }

    fn allows(&self, actor: &Actor, action: PolicyAction, _owner_id: Option<&str>) -> bool {
        catalog_allows(actor, action)
    }
}

/// 商品策略
pub struct ProductPolicy;

impl Policy for ProductPolicy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Product
    }

    fn allows(&self, actor: &Actor, action: PolicyAction, _owner_id: Option<&str>) -> bool {
        catalog_allows(actor, action)
    }
}

/// 媒体资源策略
pub struct MediaPolicy;

impl Policy for MediaPolicy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Media
    }

    fn allows(&self, actor: &Actor, action: PolicyAction, _owner_id: Option<&str>) -> bool {
        catalog_allows(actor, action)
    }
}

/// 优惠券策略
pub struct CouponPolicy;

impl Policy for CouponPolicy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Coupon
    }

    fn allows(&self, actor: &Actor, action: PolicyAction, _owner_id: Option<&str>) -> bool {
        catalog_allows(actor, action)
    }
}

/// 订单策略
///
/// 订单带归属：归属用户可查看自己的订单；
/// 状态与运单号等写操作由后台运营（admin）执行。
pub struct OrderPolicy;

impl Policy for OrderPolicy {
    fn entity_kind(&self) -> EntityKind {
        EntityKind::Order
    }

    fn allows(&self, actor: &Actor, action: PolicyAction, owner_id: Option<&str>) -> bool {
        // admin 拥有所有权限
        if actor.is_admin() {
            return true;
        }

        match action {
            PolicyAction::ViewAny => false,
            PolicyAction::View => owner_id.is_some_and(|owner| owner == actor.user_id),
            // 登录用户可为自己下单
            PolicyAction::Create => !actor.user_id.is_empty(),
            PolicyAction::Update | PolicyAction::Delete => false,
        }
    }
}
