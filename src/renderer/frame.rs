//! 帧资源
//!
//! 一个帧资源打包了一帧在飞期间 GPU 需要的全部资源：命令分配器、
//! 物体/材质/Pass 三个常量上传缓冲区，以及最近一次提交的 Fence 值。
//!
//! # 状态机
//!
//! ```text
//! Idle ──reset_recording──▶ Recording ──mark_submitted──▶ Submitted(f)
//!                              ▲                              │
//!                              └──reset_recording── Retired(f) ◀┘ (completed >= f)
//! ```

use crate::core::error::Result;
use crate::renderer::constants::{MaterialConstants, ObjectConstants, PassConstants};
use crate::renderer::device::{CommandAllocator, Device};
use crate::renderer::resource::UploadBuffer;
use crate::renderer::sync::FenceValue;

/// 帧资源的当前状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotStatus {
    /// 从未提交
    Idle,
    /// 正在记录命令
    Recording,
    /// 已提交，GPU 尚未完成
    Submitted(FenceValue),
    /// GPU 已完成，可以复用
    Retired(FenceValue),
}

/// 帧资源
pub struct FrameResource<D: Device> {
    /// 在环中的位置
    index: usize,
    command_allocator: D::CommandAllocator,
    pass_cb: UploadBuffer<PassConstants, D::Buffer>,
    object_cb: UploadBuffer<ObjectConstants, D::Buffer>,
    material_cb: UploadBuffer<MaterialConstants, D::Buffer>,
    /// 最近一次提交的 Fence 值，0 表示从未提交
    fence: FenceValue,
    recording: bool,
}

impl<D: Device> FrameResource<D> {
    /// 创建帧资源
    ///
    /// 缓冲区容量在创建时固定；场景增长后需要重建整个环。
    pub fn new(
        device: &D,
        index: usize,
        pass_count: usize,
        object_count: usize,
        material_count: usize,
    ) -> Result<Self> {
        let command_allocator = device.create_command_allocator()?;
        let pass_cb = UploadBuffer::new(device, pass_count, true, &format!("PassCB[{index}]"))?;
        let object_cb =
            UploadBuffer::new(device, object_count, true, &format!("ObjectCB[{index}]"))?;
        let material_cb =
            UploadBuffer::new(device, material_count, true, &format!("MaterialCB[{index}]"))?;

        Ok(Self {
            index,
            command_allocator,
            pass_cb,
            object_cb,
            material_cb,
            fence: FenceValue::NONE,
            recording: false,
        })
    }

    /// 重置命令分配器，开始记录新的一帧
    ///
    /// 调用方必须先确认上一次提交已经完成（`completed >= fence`）。
    pub fn reset_recording(&mut self, completed: FenceValue) -> Result<()> {
        assert!(
            self.fence.is_none() || completed >= self.fence,
            "Frame resource {} reset while fence {} is still executing (completed {})",
            self.index,
            self.fence,
            completed
        );

        self.command_allocator.reset()?;
        self.recording = true;
        Ok(())
    }

    /// 记录本帧提交后将要 signal 的 Fence 值
    pub fn mark_submitted(&mut self, fence: FenceValue) {
        assert!(
            fence > self.fence,
            "Fence values must increase: frame resource {} had {}, got {}",
            self.index,
            self.fence,
            fence
        );
        self.fence = fence;
        self.recording = false;
    }

    pub fn status(&self, completed: FenceValue) -> SlotStatus {
        if self.recording {
            SlotStatus::Recording
        } else if self.fence.is_none() {
            SlotStatus::Idle
        } else if completed >= self.fence {
            SlotStatus::Retired(self.fence)
        } else {
            SlotStatus::Submitted(self.fence)
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn fence(&self) -> FenceValue {
        self.fence
    }

    pub fn command_allocator_mut(&mut self) -> &mut D::CommandAllocator {
        &mut self.command_allocator
    }

    pub fn pass_cb(&self) -> &UploadBuffer<PassConstants, D::Buffer> {
        &self.pass_cb
    }

    pub fn pass_cb_mut(&mut self) -> &mut UploadBuffer<PassConstants, D::Buffer> {
        &mut self.pass_cb
    }

    pub fn object_cb(&self) -> &UploadBuffer<ObjectConstants, D::Buffer> {
        &self.object_cb
    }

    pub fn object_cb_mut(&mut self) -> &mut UploadBuffer<ObjectConstants, D::Buffer> {
        &mut self.object_cb
    }

    pub fn material_cb(&self) -> &UploadBuffer<MaterialConstants, D::Buffer> {
        &self.material_cb
    }

    pub fn material_cb_mut(&mut self) -> &mut UploadBuffer<MaterialConstants, D::Buffer> {
        &mut self.material_cb
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::headless::HeadlessDevice;

    #[test]
    fn test_slot_lifecycle() {
        let device = HeadlessDevice::manual();
        let mut slot = FrameResource::new(&device, 0, 1, 4, 2).unwrap();
        assert_eq!(slot.status(FenceValue::NONE), SlotStatus::Idle);
        assert_eq!(slot.object_cb().element_count(), 4);
        assert_eq!(slot.material_cb().element_count(), 2);

        slot.reset_recording(FenceValue::NONE).unwrap();
        assert_eq!(slot.status(FenceValue::NONE), SlotStatus::Recording);
        assert_eq!(slot.command_allocator_mut().reset_count(), 1);

        slot.mark_submitted(FenceValue::new(1));
        assert_eq!(slot.status(FenceValue::NONE), SlotStatus::Submitted(FenceValue::new(1)));
        assert_eq!(slot.status(FenceValue::new(1)), SlotStatus::Retired(FenceValue::new(1)));

        slot.reset_recording(FenceValue::new(1)).unwrap();
        assert_eq!(slot.command_allocator_mut().reset_count(), 2);
    }

    #[test]
    #[should_panic(expected = "still executing")]
    fn test_reset_before_retirement_panics() {
        let device = HeadlessDevice::manual();
        let mut slot = FrameResource::new(&device, 0, 1, 1, 1).unwrap();
        slot.reset_recording(FenceValue::NONE).unwrap();
        slot.mark_submitted(FenceValue::new(3));
        slot.reset_recording(FenceValue::new(2)).unwrap();
    }

    #[test]
    #[should_panic(expected = "must increase")]
    fn test_non_increasing_fence_panics() {
        let device = HeadlessDevice::manual();
        let mut slot = FrameResource::new(&device, 0, 1, 1, 1).unwrap();
        slot.mark_submitted(FenceValue::new(2));
        slot.mark_submitted(FenceValue::new(2));
    }
}
