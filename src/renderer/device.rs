//! 设备层接口
//!
//! 帧资源环只依赖这里定义的最小设备能力：
//! 创建主机可见的上传缓冲区、创建命令分配器、查询和等待 Fence、在队列上 signal。
//! 具体实现（DX12、Vulkan 或 headless 模拟设备）放在 `gfx` 模块中。

use std::time::Duration;

use crate::core::error::Result;
use crate::renderer::resource::BufferDescriptor;
use crate::renderer::sync::FenceValue;

/// 持久映射的主机可见缓冲区
pub trait MappedBuffer {
    /// 映射区域（只读）
    fn mapped(&self) -> &[u8];

    /// 映射区域（可写）
    fn mapped_mut(&mut self) -> &mut [u8];

    /// 缓冲区起始的设备地址
    fn gpu_address(&self) -> u64;
}

/// 命令分配器
///
/// 只有在使用它记录的命令全部执行完毕之后才能重置。
pub trait CommandAllocator {
    fn reset(&mut self) -> Result<()>;
}

/// 图形设备
pub trait Device {
    type Buffer: MappedBuffer;
    type CommandAllocator: CommandAllocator;

    /// 创建持久映射的上传缓冲区
    fn create_upload_buffer(&self, desc: &BufferDescriptor) -> Result<Self::Buffer>;

    /// 创建命令分配器
    fn create_command_allocator(&self) -> Result<Self::CommandAllocator>;

    /// GPU 已完成的 Fence 值
    fn completed_value(&self) -> FenceValue;

    /// 阻塞直到 GPU 完成 `value`
    ///
    /// `timeout` 为 `None` 时无限等待。
    fn wait_for_value(&self, value: FenceValue, timeout: Option<Duration>) -> Result<()>;

    /// 在命令队列末尾写入 Fence 值
    fn signal(&self, value: FenceValue) -> Result<()>;
}
