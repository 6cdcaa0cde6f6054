//! 通知类型定义
//!
//! 定义投递渠道、邮件消息、站内记录以及分发结果等数据结构。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Channel — 投递渠道
// ---------------------------------------------------------------------------

/// 通知投递渠道
///
/// 每种通知类型的渠道集合是静态的，与接收人状态无关。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Channel {
    /// 邮件
    Mail,
    /// 站内记录（落库供应用内展示）
    Database,
}

// ---------------------------------------------------------------------------
// MailMessage — 邮件内容
// ---------------------------------------------------------------------------

/// 邮件中的操作链接
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAction {
    pub label: String,
    pub url: String,
}

/// 邮件消息
///
/// 由若干有序正文行和可选的操作链接组成，
/// 渲染是纯函数，真正的投递由邮件渠道负责。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailMessage {
    pub subject: String,
    pub lines: Vec<String>,
    pub action: Option<MailAction>,
}

impl MailMessage {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            lines: Vec::new(),
            action: None,
        }
    }

    /// 追加一行正文
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push(line.into());
        self
    }

    /// 设置操作链接
    pub fn action(mut self, label: impl Into<String>, url: impl Into<String>) -> Self {
        self.action = Some(MailAction {
            label: label.into(),
            url: url.into(),
        });
        self
    }

    /// 渲染为纯文本正文，供模拟邮件渠道记录日志使用
    pub fn body_text(&self) -> String {
        let mut body = self.lines.join("\n");
        if let Some(action) = &self.action {
            body.push_str(&format!("\n{}: {}", action.label, action.url));
        }
        body
    }
}

// ---------------------------------------------------------------------------
// RecordContent / NotificationRecord — 站内记录
// ---------------------------------------------------------------------------

/// 站内记录的内容部分
///
/// 由通知类型渲染产生；持久化信封由站内渠道补齐。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordContent {
    pub order_id: i64,
    pub message: String,
}

/// 持久化的站内通知
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// 记录唯一标识（UUID v7）
    pub record_id: String,
    /// 接收人
    pub user_id: String,
    pub order_id: i64,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn new(user_id: impl Into<String>, content: RecordContent) -> Self {
        Self {
            record_id: Uuid::now_v7().to_string(),
            user_id: user_id.into(),
            order_id: content.order_id,
            message: content.message,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// ChannelOutcome / DispatchResult — 分发结果
// ---------------------------------------------------------------------------

/// 投递状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Success,
    Failed,
    /// 渠道不可用或该通知不支持此渠道
    Skipped,
}

/// 单渠道投递结果
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelOutcome {
    pub channel: Channel,
    pub status: SendStatus,
    /// 渠道返回的消息标识（成功时）
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl ChannelOutcome {
    pub fn success(channel: Channel, message_id: Option<String>, duration_ms: u64) -> Self {
        Self {
            channel,
            status: SendStatus::Success,
            message_id,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(channel: Channel, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            channel,
            status: SendStatus::Failed,
            message_id: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn skipped(channel: Channel, reason: impl Into<String>) -> Self {
        Self {
            channel,
            status: SendStatus::Skipped,
            message_id: None,
            error: Some(reason.into()),
            duration_ms: 0,
        }
    }
}

/// 一次通知分发的汇总结果
#[derive(Debug, Clone, Serialize)]
pub struct DispatchResult {
    /// 通知类型名（用于日志）
    pub notification: &'static str,
    /// 是否所有渠道都成功
    pub success: bool,
    pub outcomes: Vec<ChannelOutcome>,
    pub duration_ms: u64,
    pub sent_at: DateTime<Utc>,
}

impl DispatchResult {
    pub fn new(notification: &'static str, outcomes: Vec<ChannelOutcome>, duration_ms: u64) -> Self {
        let success = outcomes.iter().all(|o| o.status == SendStatus::Success);
        Self {
            notification,
            success,
            outcomes,
            duration_ms,
            sent_at: Utc::now(),
        }
    }

    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SendStatus::Success)
            .count()
    }

    pub fn failure_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SendStatus::Failed)
            .count()
    }

    /// 是否部分成功
    pub fn is_partial_success(&self) -> bool {
        let success_count = self.success_count();
        success_count > 0 && success_count < self.outcomes.len()
    }
}
