//! 场景配置模块
//!
//! 定义数据驱动的场景表：几何体（子网格绘制参数）、材质和渲染项。
//! 渲染项通过名称引用几何体、子网格和材质，由 `scene::Scene::build` 统一解析。
//!
//! # 场景文件格式 (scene.toml)
//!
//! ```toml
//! [[geometries]]
//! name = "shapeGeo"
//! submeshes = [{ name = "box", index_count = 36, start_index = 0, base_vertex = 0 }]
//!
//! [[materials]]
//! name = "water"
//! diffuse_albedo = [0.0, 0.2, 0.6, 0.5]
//! fresnel_r0 = [0.1, 0.1, 0.1]
//! roughness = 0.0
//! scroll = [0.1, 0.02]
//!
//! [[items]]
//! name = "castle"
//! geometry = "shapeGeo"
//! submesh = "box"
//! material = "bricks0"
//! layer = "opaque"
//! transform = { position = [0.0, 2.0, 0.0], scale = [10.0, 4.0, 10.0] }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{Result, SceneError};
use crate::math::{matrix, utils, Matrix4};
use crate::renderer::draw::RenderLayer;

/// 3D 变换数据
///
/// 包含位置、旋转和缩放信息。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// 位置 (x, y, z)
    #[serde(default = "default_position")]
    pub position: [f32; 3],

    /// 旋转（欧拉角，度数）(pitch, yaw, roll)
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 3],

    /// 缩放 (x, y, z)
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
}

fn default_position() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_rotation() -> [f32; 3] {
    [0.0, 0.0, 0.0]
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: default_position(),
            rotation: default_rotation(),
            scale: default_scale(),
        }
    }
}

impl Transform {
    pub fn new(position: [f32; 3], rotation: [f32; 3], scale: [f32; 3]) -> Self {
        Self { position, rotation, scale }
    }

    /// 创建模型矩阵
    ///
    /// 变换顺序：缩放 -> 旋转 -> 平移
    pub fn to_matrix(&self) -> Matrix4 {
        let pitch = utils::deg_to_rad(self.rotation[0]);
        let yaw = utils::deg_to_rad(self.rotation[1]);
        let roll = utils::deg_to_rad(self.rotation[2]);

        let translation = matrix::translation(self.position[0], self.position[1], self.position[2]);
        let rotation =
            matrix::rotation_z(roll) * matrix::rotation_y(yaw) * matrix::rotation_x(pitch);
        let scale = matrix::scaling(self.scale[0], self.scale[1], self.scale[2]);

        // 组合：T * R * S
        translation * rotation * scale
    }
}

/// 轨道相机配置
///
/// 相机位于以原点为中心的球面上，`theta` 为方位角，`phi` 为极角（弧度）。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_radius")]
    pub radius: f32,

    #[serde(default = "default_theta")]
    pub theta: f32,

    #[serde(default = "default_phi")]
    pub phi: f32,

    /// 垂直视场角（度数）
    #[serde(default = "default_fov")]
    pub fov: f32,

    /// 近裁剪面距离
    #[serde(default = "default_near_clip")]
    pub near_clip: f32,

    /// 远裁剪面距离
    #[serde(default = "default_far_clip")]
    pub far_clip: f32,
}

fn default_radius() -> f32 { 50.0 }
fn default_theta() -> f32 { 1.5 * std::f32::consts::PI }
fn default_phi() -> f32 { 0.2 * std::f32::consts::PI }
fn default_fov() -> f32 { 45.0 }
fn default_near_clip() -> f32 { 1.0 }
fn default_far_clip() -> f32 { 1000.0 }

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: default_radius(),
            theta: default_theta(),
            phi: default_phi(),
            fov: default_fov(),
            near_clip: default_near_clip(),
            far_clip: default_far_clip(),
        }
    }
}

/// 子网格绘制参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmeshConfig {
    pub name: String,
    pub index_count: u32,
    #[serde(default)]
    pub start_index: u32,
    #[serde(default)]
    pub base_vertex: i32,
}

/// 几何体配置
///
/// 网格本身由外部几何生成器提供，这里只记录子网格在共享缓冲区中的范围。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryConfig {
    pub name: String,
    #[serde(default)]
    pub submeshes: Vec<SubmeshConfig>,
}

/// 材质配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterialConfig {
    pub name: String,

    #[serde(default = "default_albedo")]
    pub diffuse_albedo: [f32; 4],

    #[serde(default = "default_fresnel")]
    pub fresnel_r0: [f32; 3],

    #[serde(default = "default_roughness")]
    pub roughness: f32,

    /// 纹理坐标滚动速度（每秒），用于水面等动画材质
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll: Option<[f32; 2]>,
}

fn default_albedo() -> [f32; 4] { [1.0, 1.0, 1.0, 1.0] }
fn default_fresnel() -> [f32; 3] { [0.05, 0.05, 0.05] }
fn default_roughness() -> f32 { 0.25 }

/// 渲染项配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderItemConfig {
    pub name: String,
    pub geometry: String,
    pub submesh: String,
    pub material: String,

    #[serde(default)]
    pub layer: RenderLayer,

    #[serde(default)]
    pub transform: Transform,

    /// 纹理坐标缩放
    #[serde(default = "default_scale")]
    pub tex_scale: [f32; 3],
}

/// 场景配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    #[serde(default)]
    pub camera: CameraConfig,

    #[serde(default)]
    pub geometries: Vec<GeometryConfig>,

    #[serde(default)]
    pub materials: Vec<MaterialConfig>,

    #[serde(default)]
    pub items: Vec<RenderItemConfig>,
}

fn submesh(name: &str, index_count: u32, start_index: u32, base_vertex: i32) -> SubmeshConfig {
    SubmeshConfig {
        name: name.to_string(),
        index_count,
        start_index,
        base_vertex,
    }
}

fn material(
    name: &str,
    diffuse_albedo: [f32; 4],
    fresnel_r0: f32,
    roughness: f32,
) -> MaterialConfig {
    MaterialConfig {
        name: name.to_string(),
        diffuse_albedo,
        fresnel_r0: [fresnel_r0; 3],
        roughness,
        scroll: None,
    }
}

fn item(
    name: &str,
    geometry: &str,
    submesh: &str,
    material: &str,
    layer: RenderLayer,
    transform: Transform,
) -> RenderItemConfig {
    RenderItemConfig {
        name: name.to_string(),
        geometry: geometry.to_string(),
        submesh: submesh.to_string(),
        material: material.to_string(),
        layer,
        transform,
        tex_scale: default_scale(),
    }
}

impl Default for SceneConfig {
    /// 默认场景：城堡、护城河、草地、迷宫墙、骷髅和树木精灵
    #[rustfmt::skip]
    fn default() -> Self {
        let shapes = GeometryConfig {
            name: "shapeGeo".to_string(),
            submeshes: vec![
                submesh("box", 36, 0, 0),
                submesh("grid", 13_806, 36, 24),
                submesh("cylinder", 2_400, 13_842, 2_424),
                submesh("cone", 1_200, 16_242, 2_865),
                submesh("diamond", 24, 17_442, 3_306),
                submesh("torus", 4_800, 17_466, 3_312),
                submesh("pyramid", 18, 22_266, 4_153),
                submesh("wedge", 24, 22_284, 4_158),
            ],
        };
        let skull = GeometryConfig {
            name: "skullGeo".to_string(),
            submeshes: vec![submesh("skull", 60_339, 0, 0)],
        };
        let trees = GeometryConfig {
            name: "treeSpritesGeo".to_string(),
            submeshes: vec![submesh("points", 16, 0, 0)],
        };

        let mut water = material("water", [0.0, 0.2, 0.6, 0.5], 0.1, 0.0);
        water.scroll = Some([0.1, 0.02]);

        let materials = vec![
            material("bricks0", [1.0, 1.0, 1.0, 1.0], 0.05, 0.1),
            material("stone0", [1.0, 1.0, 1.0, 1.0], 0.05, 0.1),
            material("tile0", [1.0, 1.0, 1.0, 1.0], 0.02, 0.2),
            material("grassMat", [1.0, 1.0, 1.0, 1.0], 0.05, 0.3),
            material("treeSprites", [1.0, 1.0, 1.0, 1.0], 0.01, 0.125),
            water,
        ];

        let mut items = vec![
            item("castle", "shapeGeo", "box", "bricks0", RenderLayer::Opaque,
                Transform::new([0.0, 2.0, 0.0], [0.0; 3], [10.0, 4.0, 10.0])),
            item("moat", "shapeGeo", "torus", "water", RenderLayer::Transparent,
                Transform::new([0.0, 0.0, 0.0], [90.0, 0.0, 0.0], [1.0, 1.0, 0.1])),
            item("ground", "shapeGeo", "grid", "grassMat", RenderLayer::Opaque,
                Transform::new([0.0; 3], [0.0; 3], [4.0, 1.0, 4.0])),
            item("keep", "shapeGeo", "cylinder", "stone0", RenderLayer::Opaque,
                Transform::new([0.0, 8.0, 0.0], [0.0; 3], [2.0, 4.0, 2.0])),
            item("keep_roof", "shapeGeo", "cone", "tile0", RenderLayer::Opaque,
                Transform::new([0.0, 14.0, 0.0], [0.0; 3], [2.5, 2.0, 2.5])),
            item("gem", "shapeGeo", "diamond", "tile0", RenderLayer::Opaque,
                Transform::new([0.0, 17.0, 0.0], [0.0, 45.0, 0.0], [0.5, 0.5, 0.5])),
            item("gate", "shapeGeo", "box", "stone0", RenderLayer::Opaque,
                Transform::new([0.0, 1.5, -5.1], [0.0; 3], [3.0, 3.0, 0.2])),
            item("bridge", "shapeGeo", "box", "tile0", RenderLayer::Opaque,
                Transform::new([0.0, 0.1, -10.0], [0.0; 3], [3.0, 0.2, 8.0])),
            item("skull", "skullGeo", "skull", "stone0", RenderLayer::Opaque,
                Transform::new([0.0, 4.5, -6.0], [0.0; 3], [0.3, 0.3, 0.3])),
            item("trees", "treeSpritesGeo", "points", "treeSprites", RenderLayer::AlphaTestedTreeSprites,
                Transform::default()),
        ];

        // 四角塔楼
        for (i, (x, z)) in [(-5.0, -5.0), (5.0, -5.0), (-5.0, 5.0), (5.0, 5.0)].into_iter().enumerate() {
            items.push(item(&format!("tower_{i}"), "shapeGeo", "cylinder", "stone0", RenderLayer::Opaque,
                Transform::new([x, 3.0, z], [0.0; 3], [1.0, 3.0, 1.0])));
            items.push(item(&format!("tower_roof_{i}"), "shapeGeo", "pyramid", "tile0", RenderLayer::Opaque,
                Transform::new([x, 7.0, z], [0.0; 3], [1.5, 1.5, 1.5])));
        }

        // 迷宫墙
        for (i, (x, z, yaw)) in [
            (-12.0, -8.0, 0.0),
            (12.0, -8.0, 0.0),
            (-12.0, 8.0, 90.0),
            (12.0, 8.0, 90.0),
        ]
        .into_iter()
        .enumerate()
        {
            items.push(item(&format!("maze_wall_{i}"), "shapeGeo", "box", "bricks0", RenderLayer::Opaque,
                Transform::new([x, 1.0, z], [0.0, yaw, 0.0], [6.0, 2.0, 0.5])));
            items.push(item(&format!("maze_ramp_{i}"), "shapeGeo", "wedge", "stone0", RenderLayer::AlphaTested,
                Transform::new([x, 0.5, z + 1.0], [0.0, yaw, 0.0], [1.0, 1.0, 1.0])));
        }

        if let Some(ground) = items.iter_mut().find(|i| i.name == "ground") {
            ground.tex_scale = [8.0, 8.0, 1.0];
        }

        Self {
            camera: CameraConfig::default(),
            geometries: vec![shapes, skull, trees],
            materials,
            items,
        }
    }
}

impl SceneConfig {
    /// 从文件加载场景配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|_| SceneError::FileNotFound(path.to_path_buf()))?;

        Self::from_toml(&contents)
    }

    /// 从 TOML 字符串解析场景配置
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| SceneError::ParseError(e.to_string()).into())
    }

    /// 从文件加载，如果文件不存在则返回默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if path.exists() {
            match Self::from_file(path) {
                Ok(config) => {
                    tracing::info!("Loaded scene config from: {}", path.display());
                    config
                }
                Err(e) => {
                    crate::engine_warn!("Failed to load scene config: {}, using defaults", e);
                    Self::default()
                }
            }
        } else {
            tracing::info!("Scene config not found, using defaults");
            Self::default()
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let contents = toml::to_string_pretty(self)
            .map_err(|e| SceneError::ParseError(e.to_string()))?;

        fs::write(path, contents)?;
        tracing::info!("Saved scene config to: {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_transform() {
        let transform = Transform::default();
        assert_eq!(transform.position, [0.0, 0.0, 0.0]);
        assert_eq!(transform.rotation, [0.0, 0.0, 0.0]);
        assert_eq!(transform.scale, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_transform_to_matrix() {
        let transform = Transform::new([1.0, 2.0, 3.0], [0.0; 3], [2.0, 2.0, 2.0]);
        let matrix = transform.to_matrix();

        // 平移在第四列，缩放在对角线
        assert!((matrix[(0, 3)] - 1.0).abs() < 0.001);
        assert!((matrix[(1, 3)] - 2.0).abs() < 0.001);
        assert!((matrix[(2, 3)] - 3.0).abs() < 0.001);
        assert!((matrix[(0, 0)] - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_default_scene_references_resolve() {
        let scene = SceneConfig::default();
        for item in &scene.items {
            let geometry = scene.geometries.iter().find(|g| g.name == item.geometry);
            assert!(geometry.is_some(), "missing geometry for {}", item.name);
            assert!(geometry.unwrap().submeshes.iter().any(|s| s.name == item.submesh));
            assert!(scene.materials.iter().any(|m| m.name == item.material));
        }
        assert!(scene.materials.iter().any(|m| m.scroll.is_some()));
    }

    #[test]
    fn test_parse_minimal_scene() {
        let toml = r#"
            [[geometries]]
            name = "shapeGeo"
            submeshes = [{ name = "box", index_count = 36 }]

            [[materials]]
            name = "bricks0"

            [[items]]
            name = "crate"
            geometry = "shapeGeo"
            submesh = "box"
            material = "bricks0"
            layer = "alpha_tested"
            transform = { position = [0.0, 1.0, 0.0] }
        "#;
        let scene = SceneConfig::from_toml(toml).unwrap();
        assert_eq!(scene.items.len(), 1);
        assert_eq!(scene.items[0].layer, RenderLayer::AlphaTested);
        assert_eq!(scene.items[0].transform.scale, [1.0, 1.0, 1.0]);
        assert_eq!(scene.materials[0].roughness, 0.25);
        assert_eq!(scene.camera.fov, 45.0);
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir()
            .join(format!("frame_ring_scene_{}.toml", std::process::id()));
        let scene = SceneConfig::default();
        scene.save_to_file(&path).unwrap();

        let loaded = SceneConfig::from_file(&path).unwrap();
        assert_eq!(loaded.items.len(), scene.items.len());
        assert_eq!(loaded.items[1].layer, scene.items[1].layer);
        let water = loaded.materials.iter().find(|m| m.name == "water").unwrap();
        assert_eq!(water.scroll, Some([0.1, 0.02]));
        std::fs::remove_file(&path).ok();

        // 解析失败时回退到默认场景
        std::fs::write(&path, "[[items]]\nname = 3\n").unwrap();
        assert_eq!(SceneConfig::from_file_or_default(&path).items.len(), scene.items.len());
        std::fs::remove_file(&path).ok();
    }
}
