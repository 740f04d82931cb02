// ==========================================
// 仓库 MTO+MTS 补货规则 - 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 环境变量: RUST_LOG 过滤级别, STOCK_MTS_MTO_LOG_FORMAT=json 切换结构化输出
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 默认过滤器: 本 crate 输出 info，依赖库只输出 warn
pub const DEFAULT_FILTER: &str = "warn,stock_mts_mto_rule=info";

/// 日志格式切换环境变量
pub const ENV_LOG_FORMAT: &str = "STOCK_MTS_MTO_LOG_FORMAT";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    /// 解析格式名（大小写不敏感），未知值回退 Text
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Text
        }
    }

    fn from_env() -> Self {
        std::env::var(ENV_LOG_FORMAT)
            .map(|v| Self::parse(&v))
            .unwrap_or(LogFormat::Text)
    }
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: `warn,stock_mts_mto_rule=info`）
///   例如: RUST_LOG=stock_mts_mto_rule=debug
/// - STOCK_MTS_MTO_LOG_FORMAT: `json` 时输出 JSON 行
///
/// # 示例
/// ```no_run
/// use stock_mts_mto_rule::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // 重复初始化时保持首个订阅者
    let result = match LogFormat::from_env() {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(false)
            .try_init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .try_init(),
    };
    if result.is_err() {
        tracing::debug!("日志系统已初始化，忽略重复调用");
    }
}

/// 初始化测试环境的日志系统
///
/// 使用 debug 级别并写入测试输出
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!(LogFormat::parse("JSON"), LogFormat::Json);
        assert_eq!(LogFormat::parse(" json "), LogFormat::Json);
        assert_eq!(LogFormat::parse("text"), LogFormat::Text);
        assert_eq!(LogFormat::parse(""), LogFormat::Text);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_test();
        init_test();
        init();
        tracing::info!("logging ready");
    }
}
