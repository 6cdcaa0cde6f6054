//! 演示数据预置
//!
//! 向订单仓储写入演示用户与订单，供本地开发环境启动时调用。

use tracing::info;

use store_shared::error::Result;
use store_shared::orders::{OrderRepository, User};

/// 预置结果统计
#[derive(Debug, Clone, Copy)]
pub struct SeedStats {
    pub users: usize,
    pub orders: usize,
}

/// 预置演示用户与订单
///
/// 每个演示用户创建两笔待处理订单。
pub async fn seed_demo_data(repo: &dyn OrderRepository) -> Result<SeedStats> {
    let users = [
        ("user-001", "Alice Chen", "alice@example.com"),
        ("user-002", "Bob Lee", "bob@example.com"),
        ("user-003", "Carol Wang", "carol@example.com"),
    ];

    let mut order_count = 0;
    for (user_id, name, email) in &users {
        repo.upsert_user(User {
            user_id: user_id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
        })
        .await?;

        for _ in 0..2 {
            repo.create(user_id).await?;
            order_count += 1;
        }
    }

    let stats = SeedStats {
        users: users.len(),
        orders: order_count,
    };

    info!(users = stats.users, orders = stats.orders, "演示数据预置完成");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use store_shared::orders::{InMemoryOrderRepository, OrderStatus};

    #[tokio::test]
    async fn test_seed_demo_data() {
        let repo = InMemoryOrderRepository::new();
        let stats = seed_demo_data(&repo).await.unwrap();

        assert_eq!(stats.users, 3);
        assert_eq!(stats.orders, 6);
        assert_eq!(repo.order_count(), 6);

        // 预置用户可查询
        let user = repo.find_user("user-001").await.unwrap().unwrap();
        assert_eq!(user.email, "alice@example.com");

        // 预置订单均为待处理状态
        for order_id in 1..=6 {
            let order = repo.find(order_id).await.unwrap().unwrap();
            assert_eq!(order.status(), OrderStatus::Pending);
        }
    }
}
