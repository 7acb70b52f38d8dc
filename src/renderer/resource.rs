//! 资源管理模块
//!
//! 提供上传缓冲区（CPU -> GPU）的统一抽象，自动处理常量缓冲区的对齐要求。
//!
//! # 设计原则
//!
//! - **自动对齐**：常量缓冲区的每个元素对齐到 256 字节
//! - **类型安全**：元素类型必须是 `bytemuck::Pod`，写入时不会出现部分记录
//! - **无内部同步**：同一元素不会在 GPU 读取期间被覆盖，这由帧资源环保证

use std::marker::PhantomData;

use bytemuck::Pod;

use crate::core::error::{GraphicsError, Result};
use crate::renderer::device::{Device, MappedBuffer};

/// 常量缓冲区对齐要求（字节）
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 计算常量缓冲区元素的对齐大小
pub fn constant_buffer_byte_size(size: u64) -> u64 {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsageType {
    /// 常量缓冲区（Uniform Buffer）
    Constant,
    /// 普通上传缓冲区（结构化数据）
    Upload,
}

/// 缓冲区描述信息
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// 缓冲区大小（字节）
    pub size: u64,
    /// 使用类型
    pub usage: BufferUsageType,
    /// 调试名称（可选）
    pub name: Option<String>,
}

impl BufferDescriptor {
    pub fn new(size: u64, usage: BufferUsageType) -> Self {
        Self {
            size,
            usage,
            name: None,
        }
    }

    /// 设置调试名称
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// 计算对齐后的大小
    pub fn aligned_size(&self) -> u64 {
        match self.usage {
            BufferUsageType::Constant => constant_buffer_byte_size(self.size),
            BufferUsageType::Upload => self.size,
        }
    }
}

/// 上传缓冲区
///
/// 持久映射的主机可见缓冲区，按元素索引更新。
///
/// # 类型参数
///
/// * `T` - 缓冲区中存储的记录类型
/// * `B` - 设备提供的映射缓冲区
///
/// # 示例
///
/// ```
/// use frame_ring::gfx::headless::HeadlessDevice;
/// use frame_ring::renderer::constants::ObjectConstants;
/// use frame_ring::renderer::resource::UploadBuffer;
///
/// let device = HeadlessDevice::manual();
/// let mut buffer = UploadBuffer::<ObjectConstants, _>::new(&device, 16, true, "ObjectCB")?;
/// buffer.copy_data(3, &ObjectConstants::default());
/// assert_eq!(buffer.element_size(), 256);
/// # Ok::<(), frame_ring::core::FrameRingError>(())
/// ```
pub struct UploadBuffer<T, B> {
    buffer: B,
    /// 元素数量
    element_count: usize,
    /// 每个元素的大小（对齐后）
    element_size: u64,
    usage: BufferUsageType,
    _phantom: PhantomData<T>,
}

impl<T: Pod, B: MappedBuffer> UploadBuffer<T, B> {
    /// 创建新的上传缓冲区
    ///
    /// 分配失败时返回 `GraphicsError::ResourceCreation`。
    pub fn new<D>(
        device: &D,
        element_count: usize,
        is_constant_buffer: bool,
        name: &str,
    ) -> Result<Self>
    where
        D: Device<Buffer = B>,
    {
        let usage = if is_constant_buffer {
            BufferUsageType::Constant
        } else {
            BufferUsageType::Upload
        };
        let element_size =
            BufferDescriptor::new(std::mem::size_of::<T>() as u64, usage).aligned_size();
        let total_size = element_size * element_count as u64;

        let desc = BufferDescriptor::new(total_size, usage).with_name(name);
        let buffer = device.create_upload_buffer(&desc)?;

        if (buffer.mapped().len() as u64) < total_size {
            return Err(GraphicsError::ResourceCreation(format!(
                "Upload buffer '{}' mapped {} bytes, {} required",
                name,
                buffer.mapped().len(),
                total_size
            ))
            .into());
        }

        Ok(Self {
            buffer,
            element_count,
            element_size,
            usage,
            _phantom: PhantomData,
        })
    }

    /// 写入第 `index` 个元素
    ///
    /// 索引由场景内部分配，越界属于编程错误，直接 panic。
    pub fn copy_data(&mut self, index: usize, data: &T) {
        let offset = self.element_offset(index) as usize;
        let bytes = bytemuck::bytes_of(data);
        self.buffer.mapped_mut()[offset..offset + bytes.len()].copy_from_slice(bytes);
    }

    /// 读回第 `index` 个元素
    pub fn read_data(&self, index: usize) -> T {
        let offset = self.element_offset(index) as usize;
        let size = std::mem::size_of::<T>();
        bytemuck::pod_read_unaligned(&self.buffer.mapped()[offset..offset + size])
    }

    /// 计算元素在缓冲区中的偏移量
    pub fn element_offset(&self, index: usize) -> u64 {
        assert!(
            index < self.element_count,
            "Upload buffer index {} out of bounds (capacity {})",
            index,
            self.element_count
        );
        self.element_size * index as u64
    }

    /// 第 `index` 个元素的设备地址
    pub fn element_address(&self, index: usize) -> u64 {
        self.buffer.gpu_address() + self.element_offset(index)
    }

    /// 底层缓冲区，用于绑定到管线
    pub fn resource(&self) -> &B {
        &self.buffer
    }

    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// 每个元素的大小（对齐后）
    pub fn element_size(&self) -> u64 {
        self.element_size
    }

    pub fn total_size(&self) -> u64 {
        self.element_size * self.element_count as u64
    }

    pub fn usage(&self) -> BufferUsageType {
        self.usage
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::HeadlessDevice;
    use crate::renderer::constants::{MaterialConstants, ObjectConstants};

    #[test]
    fn test_buffer_descriptor_alignment() {
        let desc = BufferDescriptor::new(100, BufferUsageType::Constant);
        assert_eq!(desc.aligned_size(), 256); // 对齐到256字节

        let desc2 = BufferDescriptor::new(300, BufferUsageType::Constant);
        assert_eq!(desc2.aligned_size(), 512);

        let desc3 = BufferDescriptor::new(100, BufferUsageType::Upload);
        assert_eq!(desc3.aligned_size(), 100); // 普通上传缓冲区不需要对齐

        assert_eq!(constant_buffer_byte_size(256), 256);
    }

    #[test]
    fn test_upload_buffer_sizing() {
        let device = HeadlessDevice::manual();

        let buffer =
            UploadBuffer::<ObjectConstants, _>::new(&device, 10, true, "ObjectCB").unwrap();
        assert_eq!(buffer.element_count(), 10);
        assert_eq!(buffer.element_size(), 256);
        assert_eq!(buffer.total_size(), 2560);
        assert_eq!(buffer.usage(), BufferUsageType::Constant);

        let buffer2 =
            UploadBuffer::<ObjectConstants, _>::new(&device, 10, false, "Objects").unwrap();
        assert_eq!(buffer2.element_size(), 128);
        assert_eq!(buffer2.total_size(), 1280);
    }

    #[test]
    fn test_copy_and_read_back() {
        let device = HeadlessDevice::manual();
        let mut buffer =
            UploadBuffer::<MaterialConstants, _>::new(&device, 4, true, "MaterialCB").unwrap();

        let record = MaterialConstants {
            roughness: 0.75,
            ..Default::default()
        };
        buffer.copy_data(2, &record);

        assert_eq!(buffer.read_data(2).roughness, 0.75);
        assert_eq!(buffer.read_data(1).roughness, 0.0);
        assert_eq!(buffer.element_address(2) - buffer.element_address(0), 512);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_copy_out_of_range_panics() {
        let device = HeadlessDevice::manual();
        let mut buffer =
            UploadBuffer::<ObjectConstants, _>::new(&device, 2, true, "ObjectCB").unwrap();
        buffer.copy_data(2, &ObjectConstants::default());
    }
}
