//! GPU 同步机制模块
//!
//! 提供 CPU-GPU 同步使用的 Fence 值和 Fence 计数器。
//!
//! # 设计原则
//!
//! - **单调递增**：每次提交都使用一个新的、更大的 Fence 值
//! - **0 表示从未提交**：帧资源的 Fence 为 0 时可以直接复用

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Fence 值
///
/// 用于 CPU-GPU 同步的单调递增值。
/// CPU 可以等待 GPU 完成特定 Fence 值对应的工作。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FenceValue(u64);

impl FenceValue {
    /// 从未提交
    pub const NONE: FenceValue = FenceValue(0);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// 是否为从未提交的哨兵值
    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    /// 下一个 Fence 值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for FenceValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fence 管理器
///
/// 管理 CPU 侧的提交计数器，并记录最近一次观察到的 GPU 完成值。
///
/// # 示例
///
/// ```
/// use frame_ring::renderer::sync::FenceManager;
///
/// let fences = FenceManager::new();
/// let value = fences.next_value();
/// assert_eq!(value.value(), 1);
///
/// fences.update_completed_value(value);
/// assert!(fences.is_completed(value));
/// ```
#[derive(Debug, Clone)]
pub struct FenceManager {
    /// 最近一次分配的 Fence 值（CPU 侧）
    current_value: Arc<AtomicU64>,
    /// 最近一次观察到的已完成值（GPU 侧）
    completed_value: Arc<AtomicU64>,
}

impl FenceManager {
    pub fn new() -> Self {
        Self {
            current_value: Arc::new(AtomicU64::new(0)),
            completed_value: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 最近一次分配的 Fence 值
    pub fn current_value(&self) -> FenceValue {
        FenceValue::new(self.current_value.load(Ordering::Acquire))
    }

    /// 最近一次观察到的已完成值
    pub fn completed_value(&self) -> FenceValue {
        FenceValue::new(self.completed_value.load(Ordering::Acquire))
    }

    /// 递增计数器并返回新的 Fence 值
    pub fn next_value(&self) -> FenceValue {
        let value = self.current_value.fetch_add(1, Ordering::AcqRel);
        FenceValue::new(value + 1)
    }

    /// 记录观察到的已完成值（只会增大）
    pub fn update_completed_value(&self, value: FenceValue) {
        self.completed_value.fetch_max(value.value(), Ordering::AcqRel);
    }

    /// 检查特定 Fence 值是否已完成
    pub fn is_completed(&self, value: FenceValue) -> bool {
        self.completed_value() >= value
    }

    /// 已提交但尚未观察到完成的 Fence 数量
    pub fn outstanding(&self) -> u64 {
        self.current_value().value().saturating_sub(self.completed_value().value())
    }
}

impl Default for FenceManager {
    fn default() -> Self {
        Self::new()
    }
}

/// 帧统计
///
/// 跟踪渲染循环的帧数、等待次数和刷新次数，用于日志输出。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub frames: u64,
    pub waits: u64,
    pub object_refreshes: u64,
    pub material_refreshes: u64,
}

impl FrameStats {
    /// 需要等待 GPU 的帧所占比例
    pub fn wait_ratio(&self) -> f32 {
        if self.frames == 0 {
            0.0
        } else {
            self.waits as f32 / self.frames as f32
        }
    }
}
