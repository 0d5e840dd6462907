//! 配置管理模块
//!
//! 提供场景运行配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [time]
//! max_delta = 1.0          # 单帧最大时间步长（秒），超出部分被截断
//! fixed_timestep_ms = 16   # fixed_update 的固定步长（毫秒）
//! max_fixed_steps = 64     # 每帧最多执行的 fixed_update 次数
//! frame_limit = 0          # 运行的帧数，0 表示不限制
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, Result};

/// 场景运行配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 帧时间配置
    #[serde(default)]
    pub time: TimeConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 帧时间配置
///
/// 取代全局的时钟宏与固定步长常量，显式传入 [`Scene`](crate::runtime::Scene)。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// 单帧最大时间步长（秒）
    ///
    /// 调试器暂停或卡顿之后测得的巨大间隔会被截断到此值，
    /// 避免物理/游戏逻辑使用不稳定的步长。
    #[serde(default = "default_max_delta")]
    pub max_delta: f32,

    /// fixed_update 的固定步长（毫秒）
    #[serde(default = "default_fixed_timestep_ms")]
    pub fixed_timestep_ms: u64,

    /// 每帧最多执行的 fixed_update 次数
    #[serde(default = "default_max_fixed_steps")]
    pub max_fixed_steps: u32,

    /// 运行的帧数，0 表示不限制
    #[serde(default)]
    pub frame_limit: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_max_delta() -> f32 { 1.0 }
fn default_fixed_timestep_ms() -> u64 { 16 }
fn default_max_fixed_steps() -> u32 { 64 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "distscene.log".to_string() }

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            max_delta: default_max_delta(),
            fixed_timestep_ms: default_fixed_timestep_ms(),
            max_fixed_steps: default_max_fixed_steps(),
            frame_limit: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl TimeConfig {
    /// 固定步长（秒）
    pub fn fixed_timestep(&self) -> f32 {
        Duration::from_millis(self.fixed_timestep_ms).as_secs_f32()
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use dist_scene::core::Config;
    ///
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在或无法解析则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--max-dt <seconds>`: 单帧最大时间步长
    /// - `--fixed-step-ms <ms>`: 固定步长
    /// - `--frames <n>`: 运行的帧数
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(value) = arg_value(&args, "--max-dt") {
            self.time.max_delta = value;
        }

        if let Some(value) = arg_value(&args, "--fixed-step-ms") {
            self.time.fixed_timestep_ms = value;
        }

        if let Some(value) = arg_value(&args, "--frames") {
            self.time.frame_limit = value;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if !(self.time.max_delta > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "time.max_delta".to_string(),
                reason: "Maximum delta must be greater than 0".to_string(),
            }.into());
        }

        if Duration::try_from_secs_f32(self.time.max_delta).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "time.max_delta".to_string(),
                reason: format!("{} seconds is not a representable duration", self.time.max_delta),
            }.into());
        }

        if self.time.fixed_timestep_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "time.fixed_timestep_ms".to_string(),
                reason: "Fixed timestep must be greater than 0".to_string(),
            }.into());
        }

        if self.time.max_fixed_steps == 0 {
            return Err(ConfigError::InvalidValue {
                field: "time.max_fixed_steps".to_string(),
                reason: "At least one fixed step per frame must be allowed".to_string(),
            }.into());
        }

        Ok(())
    }
}

/// 查找 `flag` 后面紧跟的参数并解析，解析失败时忽略
fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DistSceneError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.time.max_delta, 1.0);
        assert_eq!(config.time.fixed_timestep_ms, 16);
        assert!((config.time.fixed_timestep() - 0.016).abs() < 1e-6);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.time.fixed_timestep_ms = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.time.max_delta = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unrepresentable_max_delta_is_rejected() {
        let mut config = Config::default();
        config.apply_args(["dist_scene", "--max-dt", "inf"]);
        assert!(config.time.max_delta.is_infinite());
        assert!(matches!(
            config.validate(),
            Err(DistSceneError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "time.max_delta"
        ));

        config.time.max_delta = 1e30;
        assert!(config.validate().is_err());

        config.time.max_delta = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["dist_scene", "--max-dt", "0.5", "--fixed-step-ms", "10", "--frames", "120"]);
        assert_eq!(config.time.max_delta, 0.5);
        assert_eq!(config.time.fixed_timestep_ms, 10);
        assert_eq!(config.time.frame_limit, 120);

        // 无法解析的值被忽略
        config.apply_args(["--frames", "many"]);
        assert_eq!(config.time.frame_limit, 120);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[time]\nfixed_timestep_ms = 20\n").unwrap();
        assert_eq!(config.time.fixed_timestep_ms, 20);
        assert_eq!(config.time.max_delta, 1.0);
        assert!(!config.logging.file_output);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.time.max_fixed_steps = 8;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.time.max_fixed_steps, 8);
    }

    #[test]
    fn test_missing_file() {
        assert!(Config::from_file("does/not/exist.toml").is_err());
        let config = Config::from_file_or_default("does/not/exist.toml");
        assert_eq!(config.time.fixed_timestep_ms, 16);
    }
}
