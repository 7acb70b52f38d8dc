//! 配置管理模块
//!
//! 提供帧资源环配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [frame]
//! ring_depth = 3          # 帧资源数量
//! wait_timeout_ms = 0     # 0 表示无限等待
//! frames_to_render = 120
//!
//! [device]
//! latency_ms = 4          # headless 设备模拟的 GPU 延迟
//!
//! [window]
//! width = 800
//! height = 600
//!
//! [logging]
//! level = "info"          # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::error::{ConfigError, Result};

/// 引擎配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 帧资源环配置
    #[serde(default)]
    pub frame: FrameConfig,

    /// 设备配置
    #[serde(default)]
    pub device: DeviceConfig,

    /// 视口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 帧资源环配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameConfig {
    /// 同时在飞的帧数（环深度）
    #[serde(default = "default_ring_depth")]
    pub ring_depth: usize,

    /// 等待 Fence 的超时时间（毫秒），0 表示无限等待
    #[serde(default)]
    pub wait_timeout_ms: u64,

    /// 演示程序渲染的帧数
    #[serde(default = "default_frames_to_render")]
    pub frames_to_render: u64,
}

/// 设备配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// headless 设备完成一次提交所需的模拟时间（毫秒）
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,
}

/// 视口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 渲染目标宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 渲染目标高度
    #[serde(default = "default_height")]
    pub height: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
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
fn default_ring_depth() -> usize { 3 }
fn default_frames_to_render() -> u64 { 120 }
fn default_latency_ms() -> u64 { 4 }
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "frame_ring.log".to_string() }

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            ring_depth: default_ring_depth(),
            wait_timeout_ms: 0,
            frames_to_render: default_frames_to_render(),
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            latency_ms: default_latency_ms(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl FrameConfig {
    /// 等待超时时间，`None` 表示无限等待
    pub fn wait_timeout(&self) -> Option<Duration> {
        (self.wait_timeout_ms > 0).then(|| Duration::from_millis(self.wait_timeout_ms))
    }
}

impl DeviceConfig {
    /// 模拟的 GPU 延迟
    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }
}

impl Config {
    /// 从配置文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    ///
    /// 文件存在但无法解析时返回错误，不会静默回退。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::from_file(path)
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
    /// - `--frames <n>`: 渲染帧数
    /// - `--ring-depth <n>`: 帧资源数量
    /// - `--latency-ms <n>`: 模拟的 GPU 延迟
    /// - `--timeout-ms <n>`: Fence 等待超时
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if let Some(frames) = arg_value(&args, "--frames") {
            self.frame.frames_to_render = frames;
        }

        if let Some(depth) = arg_value(&args, "--ring-depth") {
            self.frame.ring_depth = depth;
        }

        if let Some(latency) = arg_value(&args, "--latency-ms") {
            self.device.latency_ms = latency;
        }

        if let Some(timeout) = arg_value(&args, "--timeout-ms") {
            self.frame.wait_timeout_ms = timeout;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.frame.ring_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "frame.ring_depth".to_string(),
                reason: "At least one frame resource is required".to_string(),
            }.into());
        }

        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Render target dimensions must be greater than 0".to_string(),
            }.into());
        }

        Ok(())
    }
}

/// 读取 `--flag <value>` 形式的路径参数
pub fn path_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn arg_value<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    path_arg(args, flag).and_then(|value| value.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.frame.ring_depth, 3);
        assert_eq!(config.frame.wait_timeout(), None);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.frame.ring_depth = 0;
        assert!(config.validate().is_err());

        config.frame.ring_depth = 2;
        config.window.height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args([
            "frame_ring",
            "--ring-depth",
            "2",
            "--frames",
            "10",
            "--timeout-ms",
            "50",
        ]);
        assert_eq!(config.frame.ring_depth, 2);
        assert_eq!(config.frame.frames_to_render, 10);
        assert_eq!(config.frame.wait_timeout(), Some(Duration::from_millis(50)));

        // 非法值保持原样
        config.apply_args(["--ring-depth", "many"]);
        assert_eq!(config.frame.ring_depth, 2);
    }

    #[test]
    fn test_partial_toml() {
        let config: Config = toml::from_str("[frame]\nring_depth = 2\n").unwrap();
        assert_eq!(config.frame.ring_depth, 2);
        assert_eq!(config.frame.frames_to_render, 120);
        assert_eq!(config.device.latency_ms, 4);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("frame_ring_config_missing.toml");
        let config = Config::from_file_or_default(&path).unwrap();
        assert_eq!(config.frame.ring_depth, 3);
    }

    #[test]
    fn test_malformed_file_rejected() {
        let path = std::env::temp_dir()
            .join(format!("frame_ring_config_bad_{}.toml", std::process::id()));
        std::fs::write(&path, r#"[frame]
ring_depth = "three"
"#).unwrap();

        let err = Config::from_file_or_default(&path).unwrap_err();
        assert!(matches!(
            err,
            crate::core::error::FrameRingError::Config(ConfigError::ParseError(_))
        ));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("frame_ring_config_{}.toml", std::process::id()));
        let mut config = Config::default();
        config.frame.ring_depth = 4;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.frame.ring_depth, 4);
        std::fs::remove_file(&path).ok();
    }
}
