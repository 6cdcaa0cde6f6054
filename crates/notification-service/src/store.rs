//! 站内通知存储
//!
//! 站内渠道投递的通知需要落库供应用内展示。真实部署中由数据库实现，
//! 这里提供基于 DashMap 的内存实现用于开发与测试。

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::Result;
use crate::types::NotificationRecord;

/// 站内通知存储抽象
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// 写入一条通知记录
    async fn insert(&self, record: NotificationRecord) -> Result<()>;

    /// 查询指定用户的全部通知
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>>;

    /// 当前记录总数
    async fn count(&self) -> usize;
}

/// 内存通知存储
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    records: DashMap<String, NotificationRecord>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for InMemoryNotificationStore {
    async fn insert(&self, record: NotificationRecord) -> Result<()> {
        self.records.insert(record.record_id.clone(), record);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<NotificationRecord>> {
        let mut records: Vec<NotificationRecord> = self
            .records
            .iter()
            .filter(|entry| entry.user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();

        // 按写入时间排列，同一时刻以记录 ID 决定次序
        records.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.record_id.cmp(&b.record_id))
        });
        Ok(records)
    }

    async fn count(&self) -> usize {
        self.records.len()
    }
}
