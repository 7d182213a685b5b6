//! 日志初始化

use tracing_subscriber::EnvFilter;

/// 安装 `fmt` 订阅者，过滤规则取自 `RUST_LOG`，缺省为 `info`
///
/// 重复调用不会报错（第二次起不生效）。
pub fn init_logger() {
    init_logger_with("info");
}

/// 同 [`init_logger`]，但指定 `RUST_LOG` 未设置时的默认过滤规则
pub fn init_logger_with(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}
