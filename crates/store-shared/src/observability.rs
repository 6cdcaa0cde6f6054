//! 日志初始化
//!
//! 提供统一的 tracing 订阅器配置。所有服务通过同一入口初始化日志，
//! 确保字段命名和输出格式一致。

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::ObservabilityConfig;

/// 初始化 tracing 订阅器
///
/// 日志级别优先读取 `RUST_LOG` 环境变量，未设置时回退到配置中的
/// `log_level`。格式为 `json`（结构化，便于日志采集）或 `pretty`。
pub fn init(service_name: &str, config: &ObservabilityConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if config.log_format == "json" {
        fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true)
            .with_thread_ids(true)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    info!(
        service = service_name,
        log_level = %config.log_level,
        log_format = %config.log_format,
        "日志已初始化"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_returns_error_instead_of_panicking() {
        let config = ObservabilityConfig::default();

        // 首次初始化成功；全局订阅器只能设置一次，
        // 重复初始化返回错误而非 panic。
        let first = init("test-service", &config);
        let second = init("test-service", &config);

        assert!(first.is_ok());
        assert!(second.is_err());
    }
}
