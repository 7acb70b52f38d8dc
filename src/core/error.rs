//! 错误处理模块
//!
//! 定义了帧资源环中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 错误分类
//!
//! - **资源创建失败**：环或帧槽构建期间的设备分配失败，初始化阶段致命
//! - **前置条件违反**：例如越界写入常量缓冲区、在 Fence 完成前重置命令分配器。
//!   这类问题属于编程错误，直接 `assert!` 失败，不经过这里
//! - **等待超时 / 设备丢失**：仅在配置了等待超时时出现

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, FrameRingError>;

/// 帧资源环的错误类型
#[derive(Debug, Error)]
pub enum FrameRingError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 图形设备错误
    #[error("Graphics error: {0}")]
    Graphics(#[from] GraphicsError),

    /// 场景构建错误
    #[error("Scene error: {0}")]
    Scene(#[from] SceneError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 日志系统错误
    #[error("Log error: {0}")]
    Log(String),

    /// 初始化错误
    #[error("Initialization error: {0}")]
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 图形设备相关的错误
#[derive(Debug, Error)]
pub enum GraphicsError {
    /// 资源（上传缓冲区、命令分配器）创建失败
    #[error("Resource creation failed: {0}")]
    ResourceCreation(String),

    /// 命令记录或提交失败
    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    /// 等待 Fence 超时
    #[error("Timed out after {timeout:?} waiting for fence {fence}")]
    WaitTimeout { fence: u64, timeout: Duration },

    /// 设备丢失
    #[error("Device lost: {0}")]
    DeviceLost(String),
}

/// 场景构建相关的错误
#[derive(Debug, Error)]
pub enum SceneError {
    /// 场景文件未找到
    #[error("Scene file not found: {0}")]
    FileNotFound(PathBuf),

    /// 场景文件解析失败
    #[error("Failed to parse scene: {0}")]
    ParseError(String),

    /// 引用了不存在的几何体
    #[error("Render item '{item}' references unknown geometry '{geometry}'")]
    UnknownGeometry { item: String, geometry: String },

    /// 引用了不存在的子网格
    #[error("Render item '{item}' references unknown submesh '{submesh}' in '{geometry}'")]
    UnknownSubmesh {
        item: String,
        geometry: String,
        submesh: String,
    },

    /// 引用了不存在的材质
    #[error("Render item '{item}' references unknown material '{material}'")]
    UnknownMaterial { item: String, material: String },

    /// 名称重复
    #[error("Duplicate {kind} name '{name}'")]
    DuplicateName { kind: &'static str, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: FrameRingError = GraphicsError::ResourceCreation("out of memory".into()).into();
        assert!(matches!(err, FrameRingError::Graphics(_)));
        assert_eq!(
            err.to_string(),
            "Graphics error: Resource creation failed: out of memory"
        );
    }

    #[test]
    fn test_wait_timeout_message() {
        let err = GraphicsError::WaitTimeout {
            fence: 7,
            timeout: Duration::from_millis(250),
        };
        assert_eq!(err.to_string(), "Timed out after 250ms waiting for fence 7");
    }
}
