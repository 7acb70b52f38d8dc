//! 帧资源环
//!
//! 管理 N 个帧资源的循环使用（默认 3 个）：
//! - 帧 K: CPU 正在写入
//! - 帧 K-1, K-2: GPU 可能仍在处理
//!
//! CPU 最多领先 GPU N-1 帧；轮到的帧资源若仍在 GPU 上执行，
//! `acquire_next` 会阻塞直到它的 Fence 完成。这是整个子系统唯一的阻塞点。

use std::time::Duration;

use tracing::{debug, trace};

use crate::core::error::{ConfigError, Result};
use crate::{engine_error, engine_info};
use crate::renderer::device::Device;
use crate::renderer::frame::FrameResource;
use crate::renderer::sync::FenceValue;

/// `acquire_next` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredFrame {
    /// 帧资源索引
    pub index: usize,
    /// 是否等待了 GPU
    pub waited: bool,
    /// 该帧资源上一次提交的 Fence 值
    pub previous_fence: FenceValue,
}

/// 帧资源环
pub struct FrameResourceRing<D: Device> {
    slots: Vec<FrameResource<D>>,
    /// 下一次 acquire 返回的帧资源
    next_index: usize,
    /// 最近一次 acquire 返回的帧资源
    current_index: usize,
    wait_timeout: Option<Duration>,
}

impl<D: Device> FrameResourceRing<D> {
    /// 创建帧资源环
    ///
    /// 每个帧资源包含 1 个 Pass 常量、`object_count` 个物体常量和
    /// `material_count` 个材质常量。
    pub fn new(
        device: &D,
        ring_depth: usize,
        object_count: usize,
        material_count: usize,
    ) -> Result<Self> {
        if ring_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "frame.ring_depth".to_string(),
                reason: "At least one frame resource is required".to_string(),
            }
            .into());
        }

        let slots = (0..ring_depth)
            .map(|i| FrameResource::new(device, i, 1, object_count, material_count))
            .collect::<Result<Vec<_>>>()?;

        engine_info!(ring_depth, object_count, material_count, "Frame resource ring created");

        Ok(Self {
            slots,
            next_index: 0,
            current_index: 0,
            wait_timeout: None,
        })
    }

    /// 设置等待 Fence 的超时时间，`None` 表示无限等待
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// 取得下一个帧资源
    ///
    /// 若该帧资源的上一次提交尚未完成，阻塞直到完成。
    /// 等待失败时游标不前进，当前帧资源保持不变。
    pub fn acquire_next(&mut self, device: &D) -> Result<AcquiredFrame> {
        let index = self.next_index;
        let fence = self.slots[index].fence();
        let completed = device.completed_value();
        trace!(
            index,
            fence = fence.value(),
            completed = completed.value(),
            "Acquire frame resource"
        );

        let waited = !fence.is_none() && completed < fence;
        if waited {
            debug!(index, fence = fence.value(), "Waiting for GPU (frame resource in use)");
            if let Err(e) = device.wait_for_value(fence, self.wait_timeout) {
                engine_error!(index, fence = fence.value(), "Frame resource wait failed: {}", e);
                return Err(e);
            }
        }

        self.current_index = index;
        self.next_index = (index + 1) % self.slots.len();
        Ok(AcquiredFrame {
            index,
            waited,
            previous_fence: fence,
        })
    }

    /// 等待所有帧资源的提交完成（关闭前调用）
    pub fn flush(&self, device: &D) -> Result<()> {
        let Some(last) = self.slots.iter().map(FrameResource::fence).max() else {
            return Ok(());
        };

        if !last.is_none() && device.completed_value() < last {
            debug!(fence = last.value(), "Draining frame resource ring");
            device.wait_for_value(last, self.wait_timeout)?;
        }
        Ok(())
    }

    /// 已提交但尚未完成的帧资源数量
    pub fn in_flight(&self, completed: FenceValue) -> usize {
        self.slots
            .iter()
            .filter(|slot| !slot.fence().is_none() && completed < slot.fence())
            .count()
    }

    pub fn depth(&self) -> usize {
        self.slots.len()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 最近一次 acquire 返回的帧资源
    pub fn current(&self) -> &FrameResource<D> {
        &self.slots[self.current_index]
    }

    pub fn current_mut(&mut self) -> &mut FrameResource<D> {
        &mut self.slots[self.current_index]
    }

    pub fn get(&self, index: usize) -> Option<&FrameResource<D>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameResource<D>> {
        self.slots.iter()
    }
}
