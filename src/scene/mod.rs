//! 场景
//!
//! 几何体、材质和渲染项分别保存在连续数组中，通过索引句柄相互引用。
//! 常量缓冲区索引在创建时按插入顺序分配，之后不再改变。
//!
//! 所有会改变常量的修改都经由 [`Scene`] 的方法完成，以保证修改后
//! 脏计数被重置为环深度。

mod camera;
mod geometry;
mod material;
mod render_item;

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::core::error::{Result, SceneError};
use crate::core::scene::{MaterialConfig, RenderItemConfig, SceneConfig};
use crate::math::{matrix, Matrix4, Vector3, Vector4};
use crate::renderer::constants::{MaterialConstants, ObjectConstants};
use crate::renderer::device::MappedBuffer;
use crate::renderer::dirty::DirtyPropagation;
use crate::renderer::draw::RenderLayer;
use crate::renderer::resource::UploadBuffer;

pub use camera::{OrbitCamera, AMBIENT_LIGHT};
pub use geometry::{GeometryBuffers, MeshGeometry, SubmeshGeometry};
pub use material::Material;
pub use render_item::RenderItem;

/// 几何体句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GeometryId(pub usize);

/// 材质句柄，同时也是材质常量缓冲区中的索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialId(pub usize);

/// 渲染项句柄，同时也是物体常量缓冲区中的索引
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemId(pub usize);

/// 场景
#[derive(Debug)]
pub struct Scene {
    propagation: DirtyPropagation,

    geometries: Vec<MeshGeometry>,
    materials: Vec<Material>,
    items: Vec<RenderItem>,

    geometry_names: HashMap<String, GeometryId>,
    material_names: HashMap<String, MaterialId>,
    item_names: HashMap<String, ItemId>,

    /// 按渲染层分组的渲染项
    layers: [Vec<ItemId>; RenderLayer::COUNT],
}

impl Scene {
    /// 创建空场景
    pub fn new(propagation: DirtyPropagation) -> Self {
        Self {
            propagation,
            geometries: Vec::new(),
            materials: Vec::new(),
            items: Vec::new(),
            geometry_names: HashMap::new(),
            material_names: HashMap::new(),
            item_names: HashMap::new(),
            layers: Default::default(),
        }
    }

    /// 由场景表构建场景
    ///
    /// 名称引用在这里解析；任何未知或重复的名称都会导致失败。
    pub fn build(config: &SceneConfig, propagation: DirtyPropagation) -> Result<Self> {
        let mut scene = Self::new(propagation);

        for geometry in &config.geometries {
            scene.add_geometry(MeshGeometry::from_config(geometry))?;
        }
        for material in &config.materials {
            scene.add_material(material)?;
        }
        for item in &config.items {
            scene.add_item(item)?;
        }

        debug!(
            geometries = scene.geometries.len(),
            materials = scene.materials.len(),
            items = scene.items.len(),
            "Scene built"
        );
        Ok(scene)
    }

    /// 添加几何体
    pub fn add_geometry(&mut self, geometry: MeshGeometry) -> Result<GeometryId> {
        if self.geometry_names.contains_key(geometry.name()) {
            return Err(SceneError::DuplicateName {
                kind: "geometry",
                name: geometry.name().to_string(),
            }
            .into());
        }

        let id = GeometryId(self.geometries.len());
        self.geometry_names.insert(geometry.name().to_string(), id);
        self.geometries.push(geometry);
        Ok(id)
    }

    /// 添加材质，分配下一个材质常量索引
    pub fn add_material(&mut self, config: &MaterialConfig) -> Result<MaterialId> {
        if self.material_names.contains_key(&config.name) {
            return Err(SceneError::DuplicateName {
                kind: "material",
                name: config.name.clone(),
            }
            .into());
        }

        let id = MaterialId(self.materials.len());
        self.materials
            .push(Material::from_config(config, id.0, self.propagation.initial()));
        self.material_names.insert(config.name.clone(), id);
        Ok(id)
    }

    /// 添加渲染项，分配下一个物体常量索引
    ///
    /// 常量缓冲区容量在帧资源环创建时固定，环创建之后添加的渲染项
    /// 需要重建环才能绘制。
    pub fn add_item(&mut self, config: &RenderItemConfig) -> Result<ItemId> {
        if self.item_names.contains_key(&config.name) {
            return Err(SceneError::DuplicateName {
                kind: "render item",
                name: config.name.clone(),
            }
            .into());
        }

        let geometry = self
            .find_geometry(&config.geometry)
            .ok_or_else(|| SceneError::UnknownGeometry {
                item: config.name.clone(),
                geometry: config.geometry.clone(),
            })?;
        let submesh = *self.geometries[geometry.0]
            .submesh(&config.submesh)
            .ok_or_else(|| SceneError::UnknownSubmesh {
                item: config.name.clone(),
                geometry: config.geometry.clone(),
                submesh: config.submesh.clone(),
            })?;
        let material = self
            .find_material(&config.material)
            .ok_or_else(|| SceneError::UnknownMaterial {
                item: config.name.clone(),
                material: config.material.clone(),
            })?;

        let [su, sv, sw] = config.tex_scale;
        let id = ItemId(self.items.len());
        self.items.push(RenderItem::new(
            config.name.clone(),
            id.0,
            config.transform.to_matrix(),
            matrix::scaling(su, sv, sw),
            geometry,
            material,
            submesh,
            config.layer,
            self.propagation.initial(),
        ));
        self.item_names.insert(config.name.clone(), id);
        self.layers[config.layer.index()].push(id);
        Ok(id)
    }

    /// 绑定外部几何生成器上传的顶点/索引缓冲区
    ///
    /// 缓冲区地址不属于常量数据，不会标记任何渲染项为脏。
    pub fn bind_geometry_buffers(&mut self, id: GeometryId, buffers: GeometryBuffers) {
        self.geometries[id.0].bind_buffers(buffers);
    }

    /// 设置渲染项的世界矩阵
    pub fn set_item_world(&mut self, id: ItemId, world: Matrix4) {
        let item = &mut self.items[id.0];
        item.set_world(world);
        self.propagation.mark_dirty(item);
    }

    /// 设置渲染项的纹理变换
    pub fn set_item_tex_transform(&mut self, id: ItemId, tex_transform: Matrix4) {
        let item = &mut self.items[id.0];
        item.set_tex_transform(tex_transform);
        self.propagation.mark_dirty(item);
    }

    /// 修改材质参数
    pub fn update_material<F>(&mut self, id: MaterialId, update: F)
    where
        F: FnOnce(&mut Material),
    {
        let material = &mut self.materials[id.0];
        update(material);
        self.propagation.mark_dirty(material);
    }

    pub fn set_material_albedo(&mut self, id: MaterialId, diffuse_albedo: Vector4) {
        self.update_material(id, |material| material.diffuse_albedo = diffuse_albedo);
    }

    pub fn set_material_fresnel(&mut self, id: MaterialId, fresnel_r0: Vector3, roughness: f32) {
        self.update_material(id, |material| {
            material.fresnel_r0 = fresnel_r0;
            material.roughness = roughness;
        });
    }

    /// 推进材质动画（纹理滚动），返回被修改的材质数量
    pub fn animate_materials(&mut self, delta_time: f32) -> usize {
        let mut changed = 0;
        for material in &mut self.materials {
            if material.scroll_texture(delta_time) {
                self.propagation.mark_dirty(material);
                changed += 1;
            }
        }
        changed
    }

    /// 把脏的渲染项写入物体常量缓冲区，返回写入次数
    pub fn refresh_objects<B: MappedBuffer>(
        &mut self,
        buffer: &mut UploadBuffer<ObjectConstants, B>,
    ) -> usize {
        let written = self.propagation.refresh_all(self.items.iter_mut(), buffer);
        trace!(written, "Object constants refreshed");
        written
    }

    /// 把脏的材质写入材质常量缓冲区，返回写入次数
    pub fn refresh_materials<B: MappedBuffer>(
        &mut self,
        buffer: &mut UploadBuffer<MaterialConstants, B>,
    ) -> usize {
        let written = self.propagation.refresh_all(self.materials.iter_mut(), buffer);
        trace!(written, "Material constants refreshed");
        written
    }

    pub fn find_geometry(&self, name: &str) -> Option<GeometryId> {
        self.geometry_names.get(name).copied()
    }

    pub fn find_material(&self, name: &str) -> Option<MaterialId> {
        self.material_names.get(name).copied()
    }

    pub fn find_item(&self, name: &str) -> Option<ItemId> {
        self.item_names.get(name).copied()
    }

    pub fn geometry(&self, id: GeometryId) -> &MeshGeometry {
        &self.geometries[id.0]
    }

    pub fn material(&self, id: MaterialId) -> &Material {
        &self.materials[id.0]
    }

    pub fn item(&self, id: ItemId) -> &RenderItem {
        &self.items[id.0]
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    /// 某一渲染层中的渲染项（按插入顺序）
    pub fn layer(&self, layer: RenderLayer) -> &[ItemId] {
        &self.layers[layer.index()]
    }

    pub fn object_count(&self) -> usize {
        self.items.len()
    }

    pub fn material_count(&self) -> usize {
        self.materials.len()
    }

    pub fn propagation(&self) -> DirtyPropagation {
        self.propagation
    }
}
