//! 核心功能模块
//!
//! 本模块提供了帧资源环的基础设施，包括日志系统、配置管理、错误处理、
//! 场景配置和帧计时。这些模块独立于具体的图形 API。
//!
//! # 模块组织
//!
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载引擎设置
//! - `error`：错误处理，定义统一的错误类型
//! - `scene`：场景配置（数据驱动的几何体、材质和渲染项表）
//! - `timer`：帧计时器

pub mod config;
pub mod error;
pub mod log;
pub mod scene;
pub mod timer;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use error::{FrameRingError, Result};
pub use scene::SceneConfig;
pub use timer::FrameTimer;
