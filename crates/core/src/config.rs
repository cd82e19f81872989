use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 依赖时间传播策略
///
/// - `FirstListed`: 下次运行时间取 `dep_ids` 首个依赖的时间（原始行为）
/// - `LatestOfAll`: 取全部已解析依赖中最晚的时间
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyTimePolicy {
    FirstListed,
    LatestOfAll,
}

impl Default for DependencyTimePolicy {
    fn default() -> Self {
        DependencyTimePolicy::FirstListed
    }
}

/// 系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 日志级别: trace/debug/info/warn/error
    pub log_level: String,
    /// 对账驱动器对每个任务调用 Refresh 的轮询间隔（秒）
    pub refresh_interval_seconds: u64,
    /// 调度 actor 命令通道的缓冲大小
    pub command_buffer_size: usize,
    pub dependency_time_policy: DependencyTimePolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            refresh_interval_seconds: 60,
            command_buffer_size: 128,
            dependency_time_policy: DependencyTimePolicy::FirstListed,
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序:
    /// 1. 默认配置
    /// 2. 配置文件（TOML格式）
    /// 3. 环境变量覆盖（前缀: JOBGRAPH_）
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let defaults = AppConfig::default();
        let mut builder = ConfigBuilder::builder()
            .set_default("log_level", defaults.log_level.clone())?
            .set_default(
                "refresh_interval_seconds",
                defaults.refresh_interval_seconds as i64,
            )?
            .set_default("command_buffer_size", defaults.command_buffer_size as i64)?
            .set_default("dependency_time_policy", "first_listed")?;

        if let Some(path) = config_path {
            if !Path::new(path).exists() {
                return Err(anyhow::anyhow!("配置文件不存在: {}", path));
            }
            builder = builder.add_source(File::new(path, FileFormat::Toml));
        }

        builder = builder.add_source(Environment::with_prefix("JOBGRAPH"));

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("解析配置失败")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_seconds == 0 {
            return Err(anyhow::anyhow!("刷新间隔必须大于0"));
        }

        if self.command_buffer_size == 0 {
            return Err(anyhow::anyhow!("命令通道缓冲必须大于0"));
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!(
                "无效的日志级别: {}，支持的级别: {:?}",
                self.log_level,
                valid_levels
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dependency_time_policy, DependencyTimePolicy::FirstListed);
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.refresh_interval_seconds, 60);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_load_from_toml_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "log_level = \"debug\"\nrefresh_interval_seconds = 5\ndependency_time_policy = \"latest_of_all\""
        )
        .unwrap();

        let config = AppConfig::load(file.path().to_str()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.refresh_interval_seconds, 5);
        assert_eq!(config.dependency_time_policy, DependencyTimePolicy::LatestOfAll);
        assert_eq!(config.command_buffer_size, 128);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        assert!(AppConfig::load(Some("/nonexistent/jobgraph.toml")).is_err());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let config = AppConfig {
            refresh_interval_seconds: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AppConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.log_level, config.log_level);
        assert_eq!(parsed.dependency_time_policy, config.dependency_time_policy);
    }
}
