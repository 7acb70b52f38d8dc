//! 共享材质
//!
//! 一个材质被所有引用它的渲染项共享，只在材质常量缓冲区中占一个位置。
//! 修改材质只需标记一次脏，每个帧资源各刷新一次。

use crate::core::scene::MaterialConfig;
use crate::math::{utils, Matrix4, Vector3, Vector4};
use crate::renderer::constants::MaterialConstants;
use crate::renderer::dirty::{ConstantSource, DirtyCounter};

/// 材质
#[derive(Debug, Clone)]
pub struct Material {
    name: String,
    /// 材质常量缓冲区中的索引
    mat_cb_index: usize,

    pub diffuse_albedo: Vector4,
    pub fresnel_r0: Vector3,
    pub roughness: f32,
    /// 纹理坐标变换
    pub mat_transform: Matrix4,

    /// 纹理坐标滚动速度（每秒）
    scroll: Option<[f32; 2]>,
    dirty: DirtyCounter,
}

impl Material {
    pub(crate) fn from_config(
        config: &MaterialConfig,
        mat_cb_index: usize,
        dirty: DirtyCounter,
    ) -> Self {
        Self {
            name: config.name.clone(),
            mat_cb_index,
            diffuse_albedo: Vector4::from(config.diffuse_albedo),
            fresnel_r0: Vector3::from(config.fresnel_r0),
            roughness: config.roughness,
            mat_transform: Matrix4::identity(),
            scroll: config.scroll,
            dirty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mat_cb_index(&self) -> usize {
        self.mat_cb_index
    }

    pub fn frames_dirty(&self) -> u32 {
        self.dirty.frames_dirty()
    }

    pub fn is_animated(&self) -> bool {
        self.scroll.is_some()
    }

    /// 按滚动速度平移纹理坐标，结果折回 [0, 1)
    ///
    /// 返回材质是否发生了变化。
    pub(crate) fn scroll_texture(&mut self, delta_time: f32) -> bool {
        let Some([du, dv]) = self.scroll else {
            return false;
        };

        let tu = self.mat_transform[(0, 3)] + du * delta_time;
        let tv = self.mat_transform[(1, 3)] + dv * delta_time;
        self.mat_transform[(0, 3)] = utils::wrap_unit(tu);
        self.mat_transform[(1, 3)] = utils::wrap_unit(tv);
        true
    }
}

impl ConstantSource for Material {
    type Record = MaterialConstants;

    fn constant_index(&self) -> usize {
        self.mat_cb_index
    }

    fn dirty_counter(&self) -> DirtyCounter {
        self.dirty
    }

    fn dirty_counter_mut(&mut self) -> &mut DirtyCounter {
        &mut self.dirty
    }

    fn build_record(&self) -> MaterialConstants {
        MaterialConstants {
            diffuse_albedo: self.diffuse_albedo.into(),
            fresnel_r0: self.fresnel_r0.into(),
            roughness: self.roughness,
            mat_transform: crate::math::matrix::to_gpu(&self.mat_transform),
        }
    }
}
