//! 常量缓冲区记录
//!
//! GPU 直接读取的定长记录，布局与着色器中的 cbuffer 一一对应。
//! 所有矩阵在写入前转置（见 `math::matrix::to_gpu`）。

use bytemuck::{Pod, Zeroable};

use crate::math::{matrix, Matrix4, Vector3, Vector4};

/// 场景中支持的最大光源数量
pub const MAX_LIGHTS: usize = 16;

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// 物体常量（b0）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    pub tex_transform: [[f32; 4]; 4],
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self {
            world: IDENTITY,
            tex_transform: IDENTITY,
        }
    }
}

impl ObjectConstants {
    pub fn new(world: &Matrix4, tex_transform: &Matrix4) -> Self {
        Self {
            world: matrix::to_gpu(world),
            tex_transform: matrix::to_gpu(tex_transform),
        }
    }
}

/// 材质常量（b1）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub diffuse_albedo: [f32; 4],
    pub fresnel_r0: [f32; 3],
    pub roughness: f32,
    /// 纹理映射使用的矩阵
    pub mat_transform: [[f32; 4]; 4],
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse_albedo: [1.0, 1.0, 1.0, 1.0],
            fresnel_r0: [0.01, 0.01, 0.01],
            roughness: 0.0,
            mat_transform: IDENTITY,
        }
    }
}

/// 光源
///
/// 方向光、点光源和聚光灯共用同一布局。
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Light {
    pub strength: [f32; 3],
    /// 仅点光源/聚光灯
    pub falloff_start: f32,
    /// 仅方向光/聚光灯
    pub direction: [f32; 3],
    /// 仅点光源/聚光灯
    pub falloff_end: f32,
    /// 仅点光源/聚光灯
    pub position: [f32; 3],
    /// 仅聚光灯
    pub spot_power: f32,
}

impl Light {
    /// 方向光
    pub fn directional(direction: [f32; 3], strength: [f32; 3]) -> Self {
        Self {
            strength,
            falloff_start: 1.0,
            direction,
            falloff_end: 10.0,
            position: [0.0; 3],
            spot_power: 64.0,
        }
    }
}

/// 默认的三点方向光
pub fn default_lights() -> [Light; MAX_LIGHTS] {
    let mut lights = [Light::default(); MAX_LIGHTS];
    lights[0] = Light::directional([0.57735, -0.57735, 0.57735], [0.6, 0.6, 0.6]);
    lights[1] = Light::directional([-0.57735, -0.57735, 0.57735], [0.3, 0.3, 0.3]);
    lights[2] = Light::directional([0.0, -0.707, -0.707], [0.15, 0.15, 0.15]);
    lights
}

/// Pass 常量（b2）
///
/// 每帧无条件上传一次，不做脏标记。
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    pub view: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye_pos_w: [f32; 3],
    pub cb_per_object_pad1: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient_light: [f32; 4],
    pub lights: [Light; MAX_LIGHTS],
}

impl Default for PassConstants {
    fn default() -> Self {
        Self {
            view: IDENTITY,
            inv_view: IDENTITY,
            proj: IDENTITY,
            inv_proj: IDENTITY,
            view_proj: IDENTITY,
            inv_view_proj: IDENTITY,
            eye_pos_w: [0.0; 3],
            cb_per_object_pad1: 0.0,
            render_target_size: [0.0; 2],
            inv_render_target_size: [0.0; 2],
            near_z: 0.0,
            far_z: 0.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient_light: [0.0, 0.0, 0.0, 1.0],
            lights: [Light::default(); MAX_LIGHTS],
        }
    }
}

/// 构建 Pass 常量所需的输入
///
/// 由相机控制器和计时器提供。
#[derive(Debug, Clone)]
pub struct PassInputs {
    pub view: Matrix4,
    pub proj: Matrix4,
    pub eye_position: Vector3,
    pub render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient_light: Vector4,
    pub lights: [Light; MAX_LIGHTS],
}

impl PassConstants {
    /// 由相机矩阵、视口和时间构建 Pass 常量
    pub fn build(inputs: &PassInputs) -> Self {
        let view_proj = inputs.proj * inputs.view;
        let [width, height] = inputs.render_target_size;

        Self {
            view: matrix::to_gpu(&inputs.view),
            inv_view: matrix::to_gpu(&matrix::inverse_or_identity(&inputs.view)),
            proj: matrix::to_gpu(&inputs.proj),
            inv_proj: matrix::to_gpu(&matrix::inverse_or_identity(&inputs.proj)),
            view_proj: matrix::to_gpu(&view_proj),
            inv_view_proj: matrix::to_gpu(&matrix::inverse_or_identity(&view_proj)),
            eye_pos_w: inputs.eye_position.into(),
            cb_per_object_pad1: 0.0,
            render_target_size: [width, height],
            inv_render_target_size: [1.0 / width, 1.0 / height],
            near_z: inputs.near_z,
            far_z: inputs.far_z,
            total_time: inputs.total_time,
            delta_time: inputs.delta_time,
            ambient_light: inputs.ambient_light.into(),
            lights: inputs.lights,
        }
    }
}
