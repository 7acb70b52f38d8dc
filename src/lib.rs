//! frame_ring - 帧资源环与脏常量同步
//!
//! 实时渲染器中 CPU 与 GPU 并行工作所需的核心：N 个帧资源循环使用，
//! 物体和材质常量只在变化后的 N 帧内重新上传，Pass 常量每帧上传。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（配置、日志、错误处理、计时器、场景表）
//! - `math`: 数学库（nalgebra 类型别名与矩阵辅助函数）
//! - `renderer`: 帧资源环、脏标记传播与每帧提交流程
//! - `scene`: 几何体、材质、渲染项和轨道相机
//! - `gfx`: 设备实现（headless 模拟设备）
//!
//! # 使用示例
//!
//! ```
//! use frame_ring::core::config::FrameConfig;
//! use frame_ring::core::SceneConfig;
//! use frame_ring::gfx::{HeadlessDevice, RecordingSubmitter};
//! use frame_ring::renderer::constants::PassConstants;
//! use frame_ring::renderer::dirty::DirtyPropagation;
//! use frame_ring::renderer::FrameRenderer;
//! use frame_ring::scene::Scene;
//!
//! let config = FrameConfig::default();
//! let mut scene = Scene::build(&SceneConfig::default(), DirtyPropagation::new(config.ring_depth))?;
//! let device = HeadlessDevice::with_latency(std::time::Duration::from_millis(1));
//! let mut renderer = FrameRenderer::new(device, &scene, &config)?;
//! let mut submitter = RecordingSubmitter::new();
//!
//! let report = renderer.render_frame(&mut scene, &PassConstants::default(), &mut submitter)?;
//! assert_eq!(report.slot_index, 0);
//! renderer.shutdown()?;
//! # Ok::<(), frame_ring::core::FrameRingError>(())
//! ```

pub mod core;
pub mod gfx;
pub mod math;
pub mod renderer;
pub mod scene;
