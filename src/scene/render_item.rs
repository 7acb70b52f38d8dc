//! 渲染项
//!
//! 一次绘制所需的最小数据：世界矩阵、纹理变换、几何体与材质引用、
//! 子网格绘制参数，以及在物体常量缓冲区中的固定索引。

use crate::math::Matrix4;
use crate::renderer::constants::ObjectConstants;
use crate::renderer::dirty::{ConstantSource, DirtyCounter};
use crate::renderer::draw::RenderLayer;

use super::geometry::SubmeshGeometry;
use super::{GeometryId, MaterialId};

/// 渲染项
#[derive(Debug, Clone)]
pub struct RenderItem {
    name: String,
    /// 物体常量缓冲区中的索引，创建后不变
    obj_cb_index: usize,

    world: Matrix4,
    tex_transform: Matrix4,

    geometry: GeometryId,
    material: MaterialId,
    submesh: SubmeshGeometry,
    layer: RenderLayer,

    dirty: DirtyCounter,
}

impl RenderItem {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        name: String,
        obj_cb_index: usize,
        world: Matrix4,
        tex_transform: Matrix4,
        geometry: GeometryId,
        material: MaterialId,
        submesh: SubmeshGeometry,
        layer: RenderLayer,
        dirty: DirtyCounter,
    ) -> Self {
        Self {
            name,
            obj_cb_index,
            world,
            tex_transform,
            geometry,
            material,
            submesh,
            layer,
            dirty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn obj_cb_index(&self) -> usize {
        self.obj_cb_index
    }

    pub fn world(&self) -> &Matrix4 {
        &self.world
    }

    pub fn tex_transform(&self) -> &Matrix4 {
        &self.tex_transform
    }

    pub fn geometry(&self) -> GeometryId {
        self.geometry
    }

    pub fn material(&self) -> MaterialId {
        self.material
    }

    pub fn submesh(&self) -> &SubmeshGeometry {
        &self.submesh
    }

    pub fn layer(&self) -> RenderLayer {
        self.layer
    }

    pub fn frames_dirty(&self) -> u32 {
        self.dirty.frames_dirty()
    }

    // 修改只能经由 Scene，以保证同时标记脏
    pub(crate) fn set_world(&mut self, world: Matrix4) {
        self.world = world;
    }

    pub(crate) fn set_tex_transform(&mut self, tex_transform: Matrix4) {
        self.tex_transform = tex_transform;
    }
}

impl ConstantSource for RenderItem {
    type Record = ObjectConstants;

    fn constant_index(&self) -> usize {
        self.obj_cb_index
    }

    fn dirty_counter(&self) -> DirtyCounter {
        self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }

    fn build_record(&self) -> ObjectConstants {
        ObjectConstants::new(&self.world, &self.tex_transform)
    }
}
