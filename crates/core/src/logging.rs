use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

/// 初始化全局日志订阅器
///
/// `level` 为默认级别，`RUST_LOG` 环境变量存在时优先生效。
/// 重复初始化返回错误，由调用方决定是否忽略。
pub fn init_logging(level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .context("无效的日志过滤表达式")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("日志订阅器初始化失败: {}", e))?;

    Ok(())
}
