//! 轨道相机
//!
//! 相机位于以原点为中心的球面上，始终看向原点。
//! 输出左手坐标系的视图矩阵和投影矩阵，供 Pass 常量使用。

use crate::core::scene::CameraConfig;
use crate::math::{constants, matrix, utils, Matrix4, Vector3, Vector4};
use crate::renderer::constants::{default_lights, PassConstants, PassInputs};

const MIN_RADIUS: f32 = 5.0;
const MAX_RADIUS: f32 = 150.0;
const MIN_PHI: f32 = 0.1;

/// 环境光
pub const AMBIENT_LIGHT: [f32; 4] = [0.25, 0.25, 0.35, 1.0];

/// 轨道相机
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    radius: f32,
    /// 方位角（弧度）
    theta: f32,
    /// 极角（弧度）
    phi: f32,
    /// 垂直视场角（弧度）
    fov_y: f32,
    aspect: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    pub fn from_config(config: &CameraConfig, width: u32, height: u32) -> Self {
        let mut camera = Self {
            radius: utils::clamp(config.radius, MIN_RADIUS, MAX_RADIUS),
            theta: config.theta,
            phi: utils::clamp(config.phi, MIN_PHI, constants::PI - MIN_PHI),
            fov_y: utils::deg_to_rad(config.fov),
            aspect: 1.0,
            near: config.near_clip,
            far: config.far_clip,
        };
        camera.set_viewport(width, height);
        camera
    }

    /// 视口尺寸变化时更新宽高比
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    /// 绕原点旋转（弧度）
    pub fn orbit(&mut self, d_theta: f32, d_phi: f32) {
        self.theta += d_theta;
        self.phi = utils::clamp(self.phi + d_phi, MIN_PHI, constants::PI - MIN_PHI);
    }

    /// 拉近/拉远
    pub fn zoom(&mut self, delta: f32) {
        self.radius = utils::clamp(self.radius + delta, MIN_RADIUS, MAX_RADIUS);
    }

    /// 球坐标转笛卡尔坐标
    pub fn eye_position(&self) -> Vector3 {
        Vector3::new(
            self.radius * self.phi.sin() * self.theta.cos(),
            self.radius * self.phi.cos(),
            self.radius * self.phi.sin() * self.theta.sin(),
        )
    }

    pub fn view_matrix(&self) -> Matrix4 {
        matrix::look_at_lh(&self.eye_position(), &Vector3::zeros(), &Vector3::y())
    }

    pub fn proj_matrix(&self) -> Matrix4 {
        matrix::perspective_fov_lh(self.fov_y, self.aspect, self.near, self.far)
    }

    /// 组装 Pass 常量输入
    pub fn pass_inputs(
        &self,
        render_target_size: [f32; 2],
        total_time: f32,
        delta_time: f32,
    ) -> PassInputs {
        PassInputs {
            view: self.view_matrix(),
            proj: self.proj_matrix(),
            eye_position: self.eye_position(),
            render_target_size,
            near_z: self.near,
            far_z: self.far,
            total_time,
            delta_time,
            ambient_light: Vector4::from(AMBIENT_LIGHT),
            lights: default_lights(),
        }
    }

    pub fn pass_constants(
        &self,
        render_target_size: [f32; 2],
        total_time: f32,
        delta_time: f32,
    ) -> PassConstants {
        PassConstants::build(&self.pass_inputs(render_target_size, total_time, delta_time))
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_position_on_sphere() {
        let camera = OrbitCamera::from_config(&CameraConfig::default(), 800, 600);
        let eye = camera.eye_position();
        assert!(utils::approx_eq(eye.norm(), 50.0, 1e-3));
        assert!(eye.y > 0.0);
        assert!(utils::approx_eq(camera.aspect(), 800.0 / 600.0, 1e-6));
    }

    #[test]
    fn test_view_moves_origin_in_front() {
        let camera = OrbitCamera::from_config(&CameraConfig::default(), 800, 600);
        let origin = camera.view_matrix() * Vector4::new(0.0, 0.0, 0.0, 1.0);
        // 左手坐标系：原点位于相机前方 +z
        assert!(utils::approx_eq(origin.z, camera.radius(), 1e-3));
    }

    #[test]
    fn test_zoom_and_orbit_clamped() {
        let mut camera = OrbitCamera::from_config(&CameraConfig::default(), 1, 1);
        camera.zoom(-1000.0);
        assert_eq!(camera.radius(), MIN_RADIUS);
        camera.orbit(0.0, 100.0);
        assert!(camera.eye_position().y < 0.0);
        camera.set_viewport(0, 0);
        assert_eq!(camera.aspect(), 1.0);
    }

    #[test]
    fn test_pass_constants() {
        let camera = OrbitCamera::from_config(&CameraConfig::default(), 800, 600);
        let pass = camera.pass_constants([800.0, 600.0], 2.0, 0.016);
        assert_eq!(pass.render_target_size, [800.0, 600.0]);
        assert_eq!(pass.total_time, 2.0);
        assert_eq!(pass.near_z, 1.0);
        assert_eq!(pass.ambient_light, AMBIENT_LIGHT);
    }
}
