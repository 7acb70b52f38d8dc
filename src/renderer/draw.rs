//! 绘制提交接口
//!
//! 帧资源环只负责准备常量缓冲区；真正的命令记录由外部的 [`DrawSubmitter`] 完成。
//! 每帧按渲染层顺序生成 [`FrameDrawList`]，其中每个绘制项都带有当前帧资源里
//! 物体常量和材质常量的设备地址。

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::renderer::device::Device;
use crate::renderer::frame::FrameResource;
use crate::scene::{GeometryBuffers, GeometryId, MaterialId, Scene};

/// 渲染层
///
/// 绘制顺序即声明顺序：不透明物体、Alpha 测试物体、树木精灵、透明物体。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    #[default]
    Opaque,
    AlphaTested,
    AlphaTestedTreeSprites,
    Transparent,
}

impl RenderLayer {
    pub const COUNT: usize = 4;

    /// 按绘制顺序排列的所有渲染层
    pub const ALL: [RenderLayer; Self::COUNT] = [
        RenderLayer::Opaque,
        RenderLayer::AlphaTested,
        RenderLayer::AlphaTestedTreeSprites,
        RenderLayer::Transparent,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// 对应的管线状态名称
    pub fn pipeline_name(self) -> &'static str {
        match self {
            RenderLayer::Opaque => "opaque",
            RenderLayer::AlphaTested => "alphaTested",
            RenderLayer::AlphaTestedTreeSprites => "treeSprites",
            RenderLayer::Transparent => "transparent",
        }
    }
}

/// 一次 DrawIndexedInstanced 调用所需的参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawItem {
    pub geometry: GeometryId,
    pub material: MaterialId,
    /// 几何体的顶点/索引缓冲区
    pub buffers: GeometryBuffers,
    pub index_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
    /// 物体常量的设备地址
    pub object_cb_address: u64,
    /// 材质常量的设备地址
    pub material_cb_address: u64,
}

/// 某一渲染层的绘制批次
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerBatch {
    pub layer: RenderLayer,
    pub items: Vec<DrawItem>,
}

/// 一帧的绘制列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDrawList {
    /// 帧资源索引
    pub frame_index: usize,
    /// Pass 常量的设备地址
    pub pass_cb_address: u64,
    /// 按绘制顺序排列的批次
    pub batches: Vec<LayerBatch>,
}

impl FrameDrawList {
    /// 按渲染层顺序生成绘制列表，常量地址指向 `slot` 中的缓冲区
    ///
    /// 空的渲染层不产生批次。
    pub fn build<D: Device>(scene: &Scene, slot: &FrameResource<D>) -> Self {
        let object_cb = slot.object_cb();
        let material_cb = slot.material_cb();

        let batches = RenderLayer::ALL
            .iter()
            .map(|&layer| LayerBatch {
                layer,
                items: scene
                    .layer(layer)
                    .iter()
                    .map(|&id| {
                        let item = scene.item(id);
                        let submesh = item.submesh();
                        let material = scene.material(item.material());
                        DrawItem {
                            geometry: item.geometry(),
                            material: item.material(),
                            buffers: scene.geometry(item.geometry()).buffers(),
                            index_count: submesh.index_count,
                            start_index_location: submesh.start_index_location,
                            base_vertex_location: submesh.base_vertex_location,
                            object_cb_address: object_cb.element_address(item.obj_cb_index()),
                            material_cb_address: material_cb
                                .element_address(material.mat_cb_index()),
                        }
                    })
                    .collect(),
            })
            .filter(|batch| !batch.items.is_empty())
            .collect();

        Self {
            frame_index: slot.index(),
            pass_cb_address: slot.pass_cb().element_address(0),
            batches,
        }
    }

    pub fn draw_count(&self) -> usize {
        self.batches.iter().map(|batch| batch.items.len()).sum()
    }

    pub fn batch(&self, layer: RenderLayer) -> Option<&LayerBatch> {
        self.batches.iter().find(|batch| batch.layer == layer)
    }
}

/// 记录并提交绘制命令
///
/// 调用时当前帧资源的常量缓冲区已经是最新内容，命令分配器已重置。
pub trait DrawSubmitter<D: Device> {
    fn record_and_submit(
        &mut self,
        device: &D,
        allocator: &mut D::CommandAllocator,
        frame: &FrameDrawList,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order() {
        let indices: Vec<usize> = RenderLayer::ALL.iter().map(|l| l.index()).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        assert_eq!(RenderLayer::default(), RenderLayer::Opaque);
        assert_eq!(RenderLayer::AlphaTestedTreeSprites.pipeline_name(), "treeSprites");
    }

    #[test]
    fn test_draw_count() {
        let item = DrawItem {
            geometry: GeometryId(0),
            material: MaterialId(0),
            buffers: GeometryBuffers::default(),
            index_count: 36,
            start_index_location: 0,
            base_vertex_location: 0,
            object_cb_address: 0,
            material_cb_address: 0,
        };
        let list = FrameDrawList {
            frame_index: 0,
            pass_cb_address: 0,
            batches: vec![
                LayerBatch {
                    layer: RenderLayer::Opaque,
                    items: vec![item, item],
                },
                LayerBatch {
                    layer: RenderLayer::Transparent,
                    items: vec![item],
                },
            ],
        };
        assert_eq!(list.draw_count(), 3);
        assert!(list.batch(RenderLayer::AlphaTested).is_none());
        assert_eq!(list.batch(RenderLayer::Transparent).map(|b| b.items.len()), Some(1));
    }
}
