//! 图形后端模块
//!
//! 这里放置 [`Device`](crate::renderer::device::Device) 的具体实现。
//! 目前提供 headless 模拟设备，用于在没有图形 API 的环境中运行和测试帧资源环。

pub mod headless;

pub use headless::{GpuTimeline, HeadlessDevice, RecordingSubmitter};
