//! 统一的数学库模块
//!
//! 基于 `nalgebra` 提供常量缓冲区需要的类型和矩阵辅助函数。
//!
//! # 约定
//!
//! - 主机侧使用列向量（`M * v`），变换顺序为 `T * R * S`
//! - 视图和投影使用 DirectX 风格的左手坐标系，深度范围 [0, 1]
//! - 写入 GPU 之前统一转置（见 [`matrix::to_gpu`]）

pub use nalgebra::{
    Matrix4 as Mat4, Point3, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// 浮点数比较的 epsilon
    pub const EPSILON: f32 = 1e-6;
}

/// 数学工具函数
pub mod utils {
    use super::constants;

    /// 限制值在范围内
    pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
        if value < min {
            min
        } else if value > max {
            max
        } else {
            value
        }
    }

    /// 角度转弧度
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// 将值折回 [0, 1)
    pub fn wrap_unit(value: f32) -> f32 {
        value - value.floor()
    }

    /// 检查两个浮点数是否近似相等
    pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
        (a - b).abs() < epsilon
    }
}

/// 矩阵辅助函数
pub mod matrix {
    use super::*;

    /// 创建平移矩阵
    pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_translation(&Vector3::new(x, y, z))
    }

    /// 创建缩放矩阵
    pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
        Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
    }

    /// 创建绕 X 轴旋转的矩阵
    pub fn rotation_x(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::x_axis(), angle)
    }

    /// 创建绕 Y 轴旋转的矩阵
    pub fn rotation_y(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::y_axis(), angle)
    }

    /// 创建绕 Z 轴旋转的矩阵
    pub fn rotation_z(angle: f32) -> Matrix4 {
        Matrix4::from_axis_angle(&Vector3::z_axis(), angle)
    }

    /// 左手坐标系透视投影（深度映射到 [0, 1]）
    pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4 {
        let h = 1.0 / (0.5 * fov_y).tan();
        let w = h / aspect;
        let range = far / (far - near);

        Matrix4::new(
            w, 0.0, 0.0, 0.0,
            0.0, h, 0.0, 0.0,
            0.0, 0.0, range, -range * near,
            0.0, 0.0, 1.0, 0.0,
        )
    }

    /// 左手坐标系 Look-At 视图矩阵
    pub fn look_at_lh(eye: &Vector3, target: &Vector3, up: &Vector3) -> Matrix4 {
        Matrix4::look_at_lh(&Point3::from(*eye), &Point3::from(*target), up)
    }

    /// 求逆，奇异矩阵返回单位矩阵
    pub fn inverse_or_identity(m: &Matrix4) -> Matrix4 {
        m.try_inverse().unwrap_or_else(Matrix4::identity)
    }

    /// 转换为 GPU 布局（转置后按列展开）
    pub fn to_gpu(m: &Matrix4) -> [[f32; 4]; 4] {
        m.transpose().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_translation() {
        let mat = matrix::translation(1.0, 2.0, 3.0);
        let result = mat * Vector4::new(0.0, 0.0, 0.0, 1.0);

        assert!((result.x - 1.0).abs() < 1e-6);
        assert!((result.y - 2.0).abs() < 1e-6);
        assert!((result.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_to_gpu_is_transposed() {
        let mat = matrix::translation(1.0, 2.0, 3.0);
        let gpu = matrix::to_gpu(&mat);
        // 转置后平移位于最后一行
        assert_eq!(gpu[0][3], 1.0);
        assert_eq!(gpu[1][3], 2.0);
        assert_eq!(gpu[2][3], 3.0);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = matrix::perspective_fov_lh(constants::PI / 4.0, 1.0, 1.0, 100.0);
        let near = proj * Vector4::new(0.0, 0.0, 1.0, 1.0);
        let far = proj * Vector4::new(0.0, 0.0, 100.0, 1.0);
        assert!(utils::approx_eq(near.z / near.w, 0.0, 1e-5));
        assert!(utils::approx_eq(far.z / far.w, 1.0, 1e-5));
    }

    #[test]
    fn test_wrap_unit() {
        assert!(utils::approx_eq(utils::wrap_unit(1.25), 0.25, constants::EPSILON));
        assert!(utils::approx_eq(utils::wrap_unit(0.5), 0.5, constants::EPSILON));
        assert_eq!(utils::clamp(5, 0, 3), 3);
    }
}
