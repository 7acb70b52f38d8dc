//! 渲染器模块
//!
//! 帧资源环与脏常量同步的核心。每一帧：
//!
//! 1. 取得下一个帧资源（其上一次提交未完成时阻塞）
//! 2. 只重新上传脏计数仍为正的物体/材质常量
//! 3. 无条件上传 Pass 常量
//! 4. 把帧资源交给外部的绘制提交器
//! 5. signal 新的 Fence 值并记录在帧资源上
//!
//! # 架构设计
//!
//! - `device`：设备层接口，具体实现在 `gfx` 模块中
//! - `resource` / `frame` / `ring`：上传缓冲区、帧资源、帧资源环
//! - `dirty`：脏标记传播
//! - [`FrameRenderer`]：按上述顺序驱动一帧

pub mod constants;
pub mod device;
pub mod dirty;
pub mod draw;
pub mod frame;
pub mod resource;
pub mod ring;
pub mod sync;

use tracing::trace;

use crate::core::config::FrameConfig;
use crate::core::error::{ConfigError, Result};
use crate::engine_info;
use crate::scene::Scene;

use constants::PassConstants;
use device::Device;
use draw::{DrawSubmitter, FrameDrawList};
use ring::FrameResourceRing;
use sync::{FenceManager, FenceValue, FrameStats};

/// 一帧的提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameReport {
    /// 从 1 开始的帧序号
    pub frame_number: u64,
    /// 使用的帧资源
    pub slot_index: usize,
    /// 是否等待了 GPU
    pub waited: bool,
    pub objects_refreshed: usize,
    pub materials_refreshed: usize,
    /// 本帧 signal 的 Fence 值
    pub fence: FenceValue,
}

/// 帧渲染器
pub struct FrameRenderer<D: Device> {
    device: D,
    ring: FrameResourceRing<D>,
    fences: FenceManager,
    stats: FrameStats,
    frame_number: u64,
}

impl<D: Device> FrameRenderer<D> {
    /// 为 `scene` 创建帧渲染器
    ///
    /// 常量缓冲区容量取场景当前的物体/材质数量。
    /// 场景的脏计数深度必须与环深度一致。
    pub fn new(device: D, scene: &Scene, config: &FrameConfig) -> Result<Self> {
        if scene.propagation().ring_depth() != config.ring_depth {
            return Err(ConfigError::InvalidValue {
                field: "frame.ring_depth".to_string(),
                reason: format!(
                    "Scene propagates dirty constants over {} frames but the ring has {}",
                    scene.propagation().ring_depth(),
                    config.ring_depth
                ),
            }
            .into());
        }

        let ring = FrameResourceRing::new(
            &device,
            config.ring_depth,
            scene.object_count(),
            scene.material_count(),
        )?
        .with_wait_timeout(config.wait_timeout());

        Ok(Self {
            device,
            ring,
            fences: FenceManager::new(),
            stats: FrameStats::default(),
            frame_number: 0,
        })
    }

    /// 渲染一帧
    ///
    /// 唯一可能阻塞的是第一步取得帧资源。
    pub fn render_frame<S>(
        &mut self,
        scene: &mut Scene,
        pass: &PassConstants,
        submitter: &mut S,
    ) -> Result<FrameReport>
    where
        S: DrawSubmitter<D>,
    {
        let acquired = self.ring.acquire_next(&self.device)?;
        let completed = self.device.completed_value();
        self.fences.update_completed_value(completed);

        let slot = self.ring.current_mut();
        assert!(
            scene.object_count() <= slot.object_cb().element_count()
                && scene.material_count() <= slot.material_cb().element_count(),
            "Scene grew past the frame resource capacity; rebuild the frame renderer"
        );
        slot.reset_recording(completed)?;

        let objects_refreshed = scene.refresh_objects(slot.object_cb_mut());
        let materials_refreshed = scene.refresh_materials(slot.material_cb_mut());
        slot.pass_cb_mut().copy_data(0, pass);

        let draw_list = FrameDrawList::build(scene, slot);
        submitter.record_and_submit(&self.device, slot.command_allocator_mut(), &draw_list)?;

        let fence = self.fences.next_value();
        slot.mark_submitted(fence);
        self.device.signal(fence)?;

        self.frame_number += 1;
        self.stats.frames += 1;
        self.stats.waits += u64::from(acquired.waited);
        self.stats.object_refreshes += objects_refreshed as u64;
        self.stats.material_refreshes += materials_refreshed as u64;

        let report = FrameReport {
            frame_number: self.frame_number,
            slot_index: acquired.index,
            waited: acquired.waited,
            objects_refreshed,
            materials_refreshed,
            fence,
        };
        trace!(
            frame = report.frame_number,
            slot = report.slot_index,
            waited = report.waited,
            objects = report.objects_refreshed,
            materials = report.materials_refreshed,
            fence = report.fence.value(),
            "Frame submitted"
        );
        Ok(report)
    }

    /// 等待所有在飞的帧完成
    ///
    /// 销毁帧资源之前必须调用。
    pub fn shutdown(&mut self) -> Result<()> {
        self.ring.flush(&self.device)?;
        self.fences.update_completed_value(self.device.completed_value());

        engine_info!(
            frames = self.stats.frames,
            waits = self.stats.waits,
            wait_ratio = self.stats.wait_ratio(),
            object_refreshes = self.stats.object_refreshes,
            material_refreshes = self.stats.material_refreshes,
            "Frame renderer drained"
        );
        Ok(())
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn ring(&self) -> &FrameResourceRing<D> {
        &self.ring
    }

    pub fn fences(&self) -> &FenceManager {
        &self.fences
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SceneConfig;
    use crate::gfx::headless::{HeadlessDevice, RecordingSubmitter};
    use crate::renderer::dirty::DirtyPropagation;
    use crate::renderer::draw::RenderLayer;
    use crate::scene::GeometryBuffers;

    fn setup(depth: usize) -> (FrameRenderer<HeadlessDevice>, Scene) {
        let scene = Scene::build(&SceneConfig::default(), DirtyPropagation::new(depth)).unwrap();
        let config = FrameConfig {
            ring_depth: depth,
            ..FrameConfig::default()
        };
        let renderer = FrameRenderer::new(HeadlessDevice::manual(), &scene, &config).unwrap();
        (renderer, scene)
    }

    fn pass_with_time(total_time: f32) -> PassConstants {
        PassConstants {
            total_time,
            ..PassConstants::default()
        }
    }

    #[test]
    fn test_depth_mismatch_rejected() {
        let scene = Scene::build(&SceneConfig::default(), DirtyPropagation::new(2)).unwrap();
        let config = FrameConfig {
            ring_depth: 3,
            ..FrameConfig::default()
        };
        assert!(FrameRenderer::new(HeadlessDevice::manual(), &scene, &config).is_err());
    }

    #[test]
    fn test_first_frames_upload_everything_once_per_slot() {
        let (mut renderer, mut scene) = setup(3);
        let mut submitter = RecordingSubmitter::new();
        let objects = scene.object_count();
        let materials = scene.material_count();

        for expected_fence in 1..=3u64 {
            let report = renderer
                .render_frame(&mut scene, &pass_with_time(0.0), &mut submitter)
                .unwrap();
            assert_eq!(report.fence, FenceValue::new(expected_fence));
            assert_eq!(report.slot_index, (expected_fence - 1) as usize);
            assert!(!report.waited);
            assert_eq!(report.objects_refreshed, objects);
            assert_eq!(report.materials_refreshed, materials);
        }

        // 所有帧资源都已持有初始值
        renderer.device().retire_through(FenceValue::new(3));
        let report = renderer
            .render_frame(&mut scene, &pass_with_time(0.0), &mut submitter)
            .unwrap();
        assert_eq!(report.objects_refreshed, 0);
        assert_eq!(report.materials_refreshed, 0);
        assert_eq!(renderer.stats().frames, 4);
        assert_eq!(renderer.stats().object_refreshes, 3 * objects as u64);
    }

    #[test]
    fn test_pass_constants_written_every_frame() {
        let (mut renderer, mut scene) = setup(2);
        let mut submitter = RecordingSubmitter::new();

        for frame in 1..=4u64 {
            if frame > 2 {
                renderer.device().retire_through(FenceValue::new(frame - 2));
            }
            let report = renderer
                .render_frame(&mut scene, &pass_with_time(frame as f32), &mut submitter)
                .unwrap();
            let slot = renderer.ring().get(report.slot_index).unwrap();
            assert_eq!(slot.pass_cb().read_data(0).total_time, frame as f32);
        }
    }

    #[test]
    fn test_draw_list_layer_order_and_addresses() {
        let (mut renderer, mut scene) = setup(3);
        let mut submitter = RecordingSubmitter::new();
        renderer
            .render_frame(&mut scene, &pass_with_time(0.0), &mut submitter)
            .unwrap();

        let list = submitter.last_frame().unwrap();
        let layers: Vec<RenderLayer> = list.batches.iter().map(|b| b.layer).collect();
        assert_eq!(
            layers,
            vec![
                RenderLayer::Opaque,
                RenderLayer::AlphaTested,
                RenderLayer::AlphaTestedTreeSprites,
                RenderLayer::Transparent
            ]
        );
        assert_eq!(list.draw_count(), scene.object_count());
        assert_eq!(submitter.draws(RenderLayer::Transparent), 1);

        let slot = renderer.ring().get(list.frame_index).unwrap();
        let moat = scene.item(scene.find_item("moat").unwrap());
        let draw = list.batch(RenderLayer::Transparent).unwrap().items[0];
        assert_eq!(
            draw.object_cb_address,
            slot.object_cb().element_address(moat.obj_cb_index())
        );
        assert_eq!(draw.index_count, moat.submesh().index_count);
        assert_eq!(list.pass_cb_address, slot.pass_cb().element_address(0));
    }

    #[test]
    fn test_draw_items_carry_geometry_buffers() {
        let (mut renderer, mut scene) = setup(2);
        let mut submitter = RecordingSubmitter::new();
        let shapes = scene.find_geometry("shapeGeo").unwrap();
        let buffers = GeometryBuffers {
            vertex_buffer_address: 0x4000_0000,
            vertex_byte_stride: 32,
            index_buffer_address: 0x5000_0000,
        };
        scene.bind_geometry_buffers(shapes, buffers);

        renderer
            .render_frame(&mut scene, &pass_with_time(0.0), &mut submitter)
            .unwrap();
        let list = submitter.last_frame().unwrap();
        for draw in list.batches.iter().flat_map(|batch| batch.items.iter()) {
            if draw.geometry == shapes {
                assert_eq!(draw.buffers, buffers);
            } else {
                assert!(!draw.buffers.is_bound());
            }
        }
        // 绑定缓冲区不产生常量写入
        assert_eq!(renderer.stats().object_refreshes, scene.object_count() as u64);
    }

    #[test]
    fn test_shutdown_drains() {
        let scene = Scene::build(&SceneConfig::default(), DirtyPropagation::new(3)).unwrap();
        let device = HeadlessDevice::with_latency(std::time::Duration::from_millis(1));
        let mut renderer = FrameRenderer::new(device, &scene, &FrameConfig::default()).unwrap();
        let mut scene = scene;
        let mut submitter = RecordingSubmitter::new();

        for _ in 0..5 {
            renderer
                .render_frame(&mut scene, &pass_with_time(0.0), &mut submitter)
                .unwrap();
        }
        renderer.shutdown().unwrap();
        assert_eq!(renderer.ring().in_flight(renderer.device().completed_value()), 0);
        assert_eq!(renderer.fences().outstanding(), 0);
        assert_eq!(submitter.submissions(), 5);
    }
}
