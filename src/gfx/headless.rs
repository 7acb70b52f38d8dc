//! Headless 模拟设备
//!
//! 在没有图形 API 的环境下实现 [`Device`]：上传缓冲区就是主机内存，
//! GPU 时间线由互斥锁和条件变量模拟。
//!
//! - **自动模式**（[`HeadlessDevice::with_latency`]）：后台线程按提交顺序，
//!   在固定延迟之后完成每个 signal 的 Fence 值
//! - **手动模式**（[`HeadlessDevice::manual`]）：Fence 只在调用
//!   [`GpuTimeline::retire_through`] 时完成，便于测试精确控制 GPU 进度

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, trace};

use crate::core::error::{FrameRingError, GraphicsError, Result};
use crate::renderer::device::{CommandAllocator, Device, MappedBuffer};
use crate::renderer::draw::{DrawSubmitter, FrameDrawList, RenderLayer};
use crate::renderer::resource::BufferDescriptor;
use crate::renderer::sync::FenceValue;

/// 模拟资源的放置对齐（64KB）
const RESOURCE_PLACEMENT_ALIGNMENT: u64 = 64 * 1024;
/// 第一个缓冲区的设备地址
const BASE_GPU_ADDRESS: u64 = 0x1_0000_0000;

#[derive(Debug, Default)]
struct TimelineState {
    /// 最近一次 signal 的值
    signaled: u64,
    /// GPU 已完成的值
    completed: u64,
    /// 已 signal 但尚未完成的值（手动模式）
    pending: VecDeque<u64>,
}

#[derive(Debug, Default)]
struct TimelineShared {
    state: Mutex<TimelineState>,
    retired: Condvar,
}

/// 模拟的 GPU 时间线
///
/// 可以克隆后交给其他线程，用于在测试中推进 GPU 进度。
#[derive(Debug, Clone, Default)]
pub struct GpuTimeline {
    shared: Arc<TimelineShared>,
}

impl GpuTimeline {
    fn lock(&self) -> Result<MutexGuard<'_, TimelineState>> {
        self.shared
            .state
            .lock()
            .map_err(|_| GraphicsError::DeviceLost("GPU timeline lock poisoned".to_string()).into())
    }

    /// 完成所有不大于 `value` 的 Fence 值
    pub fn retire_through(&self, value: FenceValue) {
        let Ok(mut state) = self.lock() else {
            return;
        };
        if value.value() > state.completed {
            state.completed = value.value();
        }
        let completed = state.completed;
        state.pending.retain(|&pending| pending > completed);
        drop(state);

        trace!(completed, "GPU timeline advanced");
        self.shared.retired.notify_all();
    }

    /// 完成最早一个尚未完成的提交（手动模式）
    pub fn retire_next(&self) -> Option<FenceValue> {
        let next = self.lock().ok()?.pending.front().copied()?;
        self.retire_through(FenceValue::new(next));
        Some(FenceValue::new(next))
    }

    /// 已 signal 但尚未完成的提交数量
    pub fn pending(&self) -> usize {
        self.lock().map(|state| state.pending.len()).unwrap_or(0)
    }

    pub fn completed_value(&self) -> FenceValue {
        self.lock()
            .map(|state| FenceValue::new(state.completed))
            .unwrap_or(FenceValue::NONE)
    }

    fn record_signal(&self, value: FenceValue, track_pending: bool) -> Result<()> {
        let mut state = self.lock()?;
        if value.value() <= state.signaled {
            return Err(GraphicsError::CommandExecution(format!(
                "Fence value {} signaled after {}",
                value, state.signaled
            ))
            .into());
        }
        state.signaled = value.value();
        if track_pending {
            state.pending.push_back(value.value());
        }
        Ok(())
    }

    fn wait_for_value(&self, value: FenceValue, timeout: Option<Duration>) -> Result<()> {
        fn poisoned<E>(_: E) -> GraphicsError {
            GraphicsError::DeviceLost("GPU timeline lock poisoned".to_string())
        }

        let target = value.value();
        let state = self.lock()?;

        match timeout {
            None => {
                let _state = self
                    .shared
                    .retired
                    .wait_while(state, |s| s.completed < target)
                    .map_err(poisoned)?;
                Ok(())
            }
            Some(timeout) => {
                let (_state, result) = self
                    .shared
                    .retired
                    .wait_timeout_while(state, timeout, |s| s.completed < target)
                    .map_err(poisoned)?;
                if result.timed_out() {
                    return Err(GraphicsError::WaitTimeout { fence: target, timeout }.into());
                }
                Ok(())
            }
        }
    }
}

/// 自动模式的后台线程
struct Worker {
    sender: Option<Sender<u64>>,
    handle: Option<JoinHandle<()>>,
}

impl Worker {
    fn spawn(timeline: GpuTimeline, latency: Duration) -> Result<Self> {
        let (sender, receiver) = mpsc::channel::<u64>();
        let handle = thread::Builder::new()
            .name("headless-gpu".to_string())
            .spawn(move || {
                // 发送端关闭后处理完剩余提交再退出
                while let Ok(value) = receiver.recv() {
                    if !latency.is_zero() {
                        thread::sleep(latency);
                    }
                    timeline.retire_through(FenceValue::new(value));
                }
            })
            .map_err(|e| {
                FrameRingError::Initialization(format!("Failed to spawn headless GPU thread: {e}"))
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    fn submit(&self, value: FenceValue) -> Result<()> {
        self.sender
            .as_ref()
            .and_then(|sender| sender.send(value.value()).ok())
            .ok_or_else(|| {
                GraphicsError::DeviceLost("Headless GPU thread exited".to_string()).into()
            })
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// 主机内存中的上传缓冲区
#[derive(Debug)]
pub struct HeadlessBuffer {
    name: String,
    data: Vec<u8>,
    gpu_address: u64,
}

impl HeadlessBuffer {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl MappedBuffer for HeadlessBuffer {
    fn mapped(&self) -> &[u8] {
        &self.data
    }

    fn mapped_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    fn gpu_address(&self) -> u64 {
        self.gpu_address
    }
}

/// 只记录重置次数的命令分配器
#[derive(Debug, Default)]
pub struct HeadlessCommandAllocator {
    reset_count: u64,
}

impl HeadlessCommandAllocator {
    pub fn reset_count(&self) -> u64 {
        self.reset_count
    }
}

impl CommandAllocator for HeadlessCommandAllocator {
    fn reset(&mut self) -> Result<()> {
        self.reset_count += 1;
        Ok(())
    }
}

/// Headless 模拟设备
pub struct HeadlessDevice {
    timeline: GpuTimeline,
    worker: Option<Worker>,
    next_address: AtomicU64,
    allocated_bytes: AtomicU64,
}

impl HeadlessDevice {
    fn with_timeline(timeline: GpuTimeline, worker: Option<Worker>) -> Self {
        Self {
            timeline,
            worker,
            next_address: AtomicU64::new(BASE_GPU_ADDRESS),
            allocated_bytes: AtomicU64::new(0),
        }
    }

    /// 手动模式：Fence 只在调用 `retire_through` 时完成
    pub fn manual() -> Self {
        debug!("Headless device created (manual timeline)");
        Self::with_timeline(GpuTimeline::default(), None)
    }

    /// 自动模式：每个提交在 `latency` 之后完成
    ///
    /// # Panics
    ///
    /// 无法创建后台线程时 panic，需要处理该错误时使用 [`try_with_latency`](Self::try_with_latency)。
    pub fn with_latency(latency: Duration) -> Self {
        match Self::try_with_latency(latency) {
            Ok(device) => device,
            Err(e) => panic!("Failed to start headless GPU thread: {e}"),
        }
    }

    pub fn try_with_latency(latency: Duration) -> Result<Self> {
        let timeline = GpuTimeline::default();
        let worker = Worker::spawn(timeline.clone(), latency)?;
        debug!(latency_ms = latency.as_millis() as u64, "Headless device created");
        Ok(Self::with_timeline(timeline, Some(worker)))
    }

    /// GPU 时间线句柄
    pub fn timeline(&self) -> GpuTimeline {
        self.timeline.clone()
    }

    /// 完成所有不大于 `value` 的 Fence 值
    pub fn retire_through(&self, value: FenceValue) {
        self.timeline.retire_through(value);
    }

    pub fn is_manual(&self) -> bool {
        self.worker.is_none()
    }

    /// 已分配的上传缓冲区总字节数
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes.load(Ordering::Relaxed)
    }
}

impl Device for HeadlessDevice {
    type Buffer = HeadlessBuffer;
    type CommandAllocator = HeadlessCommandAllocator;

    fn create_upload_buffer(&self, desc: &BufferDescriptor) -> Result<HeadlessBuffer> {
        let name = desc.name.as_deref().unwrap_or("unnamed");
        let size = desc.aligned_size();
        let len = usize::try_from(size).map_err(|_| {
            GraphicsError::ResourceCreation(format!(
                "Buffer '{}' is too large ({} bytes)",
                name, size
            ))
        })?;

        let reserved =
            size.max(1).div_ceil(RESOURCE_PLACEMENT_ALIGNMENT) * RESOURCE_PLACEMENT_ALIGNMENT;
        let gpu_address = self.next_address.fetch_add(reserved, Ordering::Relaxed);
        self.allocated_bytes.fetch_add(size, Ordering::Relaxed);

        trace!(name, size, gpu_address, "Upload buffer created");
        Ok(HeadlessBuffer {
            name: name.to_string(),
            data: vec![0; len],
            gpu_address,
        })
    }

    fn create_command_allocator(&self) -> Result<HeadlessCommandAllocator> {
        Ok(HeadlessCommandAllocator::default())
    }

    fn completed_value(&self) -> FenceValue {
        self.timeline.completed_value()
    }

    fn wait_for_value(&self, value: FenceValue, timeout: Option<Duration>) -> Result<()> {
        self.timeline.wait_for_value(value, timeout)
    }

    fn signal(&self, value: FenceValue) -> Result<()> {
        self.timeline.record_signal(value, self.worker.is_none())?;
        if let Some(worker) = &self.worker {
            worker.submit(value)?;
        }
        Ok(())
    }
}

/// 记录每帧绘制列表的提交器
///
/// 不产生任何 GPU 命令，只统计各渲染层的绘制次数，并保留最后一帧的绘制列表。
#[derive(Debug, Default)]
pub struct RecordingSubmitter {
    submissions: u64,
    draws_per_layer: [u64; RenderLayer::COUNT],
    last_frame: Option<FrameDrawList>,
}

impl RecordingSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submissions(&self) -> u64 {
        self.submissions
    }

    pub fn draws(&self, layer: RenderLayer) -> u64 {
        self.draws_per_layer[layer.index()]
    }

    pub fn total_draws(&self) -> u64 {
        self.draws_per_layer.iter().sum()
    }

    pub fn last_frame(&self) -> Option<&FrameDrawList> {
        self.last_frame.as_ref()
    }
}

impl<D: Device> DrawSubmitter<D> for RecordingSubmitter {
    fn record_and_submit(
        &mut self,
        _device: &D,
        _allocator: &mut D::CommandAllocator,
        frame: &FrameDrawList,
    ) -> Result<()> {
        for batch in &frame.batches {
            self.draws_per_layer[batch.layer.index()] += batch.items.len() as u64;
            trace!(
                layer = batch.layer.pipeline_name(),
                draws = batch.items.len(),
                "Draw batch recorded"
            );
        }
        self.submissions += 1;
        self.last_frame = Some(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::resource::BufferUsageType;

    #[test]
    fn test_buffer_addresses_distinct() {
        let device = HeadlessDevice::manual();
        let desc = BufferDescriptor::new(100, BufferUsageType::Constant);
        let a = device.create_upload_buffer(&desc).unwrap();
        let b = device.create_upload_buffer(&desc).unwrap();

        assert_eq!(a.mapped().len(), 256);
        assert_ne!(a.gpu_address(), b.gpu_address());
        assert_eq!(a.gpu_address() % RESOURCE_PLACEMENT_ALIGNMENT, 0);
        assert_eq!(device.allocated_bytes(), 512);
    }

    #[test]
    fn test_manual_timeline() {
        let device = HeadlessDevice::manual();
        device.signal(FenceValue::new(1)).unwrap();
        device.signal(FenceValue::new(2)).unwrap();
        assert!(device.is_manual());
        assert_eq!(device.completed_value(), FenceValue::NONE);
        assert_eq!(device.timeline().pending(), 2);

        assert_eq!(device.timeline().retire_next(), Some(FenceValue::new(1)));
        assert_eq!(device.completed_value(), FenceValue::new(1));

        device.retire_through(FenceValue::new(2));
        assert_eq!(device.timeline().pending(), 0);
        assert_eq!(device.timeline().retire_next(), None);
    }

    #[test]
    fn test_signal_must_increase() {
        let device = HeadlessDevice::manual();
        device.signal(FenceValue::new(3)).unwrap();
        assert!(device.signal(FenceValue::new(3)).is_err());
    }

    #[test]
    fn test_wait_timeout() {
        let device = HeadlessDevice::manual();
        device.signal(FenceValue::new(1)).unwrap();
        let err = device
            .wait_for_value(FenceValue::new(1), Some(Duration::from_millis(10)))
            .unwrap_err();
        assert!(err.to_string().contains("fence 1"), "{err}");
    }

    #[test]
    fn test_wait_wakes_on_retire() {
        let device = HeadlessDevice::manual();
        device.signal(FenceValue::new(1)).unwrap();

        let timeline = device.timeline();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            timeline.retire_through(FenceValue::new(1));
        });

        device.wait_for_value(FenceValue::new(1), None).unwrap();
        assert_eq!(device.completed_value(), FenceValue::new(1));
        handle.join().unwrap();
    }

    #[test]
    fn test_auto_timeline_retires() {
        let device = HeadlessDevice::with_latency(Duration::from_millis(2));
        for value in 1..=3 {
            device.signal(FenceValue::new(value)).unwrap();
        }
        device.wait_for_value(FenceValue::new(3), Some(Duration::from_secs(5))).unwrap();
        assert_eq!(device.completed_value(), FenceValue::new(3));
    }
}
