//! 网格几何体
//!
//! 顶点/索引数据由外部几何生成器上传，这里只保存缓冲区句柄和每个子网格在共享缓冲区中的范围。

use std::collections::HashMap;

use crate::core::scene::GeometryConfig;

/// 子网格在共享顶点/索引缓冲区中的范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmeshGeometry {
    pub index_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
}

/// 外部几何生成器提供的顶点/索引缓冲区视图
///
/// 地址为 0 表示尚未上传。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometryBuffers {
    pub vertex_buffer_address: u64,
    pub vertex_byte_stride: u32,
    pub index_buffer_address: u64,
}

impl GeometryBuffers {
    pub fn is_bound(&self) -> bool {
        self.vertex_buffer_address != 0 && self.index_buffer_address != 0
    }
}

/// 网格几何体
///
/// 创建后不可变，被多个渲染项共享。
#[derive(Debug, Clone)]
pub struct MeshGeometry {
    name: String,
    buffers: GeometryBuffers,
    draw_args: HashMap<String, SubmeshGeometry>,
}

impl MeshGeometry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            buffers: GeometryBuffers::default(),
            draw_args: HashMap::new(),
        }
    }

    /// 设置顶点/索引缓冲区
    pub fn with_buffers(mut self, buffers: GeometryBuffers) -> Self {
        self.buffers = buffers;
        self
    }

    /// 添加子网格
    pub fn with_submesh(mut self, name: impl Into<String>, submesh: SubmeshGeometry) -> Self {
        self.draw_args.insert(name.into(), submesh);
        self
    }

    pub fn from_config(config: &GeometryConfig) -> Self {
        config.submeshes.iter().fold(Self::new(&config.name), |geometry, submesh| {
            geometry.with_submesh(
                &submesh.name,
                SubmeshGeometry {
                    index_count: submesh.index_count,
                    start_index_location: submesh.start_index,
                    base_vertex_location: submesh.base_vertex,
                },
            )
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(super) fn bind_buffers(&mut self, buffers: GeometryBuffers) {
        self.buffers = buffers;
    }

    pub fn buffers(&self) -> GeometryBuffers {
        self.buffers
    }

    pub fn submesh(&self, name: &str) -> Option<&SubmeshGeometry> {
        self.draw_args.get(name)
    }

    pub fn submesh_count(&self) -> usize {
        self.draw_args.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::scene::SubmeshConfig;

    #[test]
    fn test_from_config() {
        let config = GeometryConfig {
            name: "shapeGeo".to_string(),
            submeshes: vec![
                SubmeshConfig {
                    name: "box".into(),
                    index_count: 36,
                    start_index: 0,
                    base_vertex: 0,
                },
                SubmeshConfig {
                    name: "grid".into(),
                    index_count: 600,
                    start_index: 36,
                    base_vertex: 24,
                },
            ],
        };
        let geometry = MeshGeometry::from_config(&config);
        assert_eq!(geometry.name(), "shapeGeo");
        assert_eq!(geometry.submesh_count(), 2);
        assert_eq!(geometry.submesh("grid").map(|s| s.base_vertex_location), Some(24));
        assert!(geometry.submesh("torus").is_none());
        assert!(!geometry.buffers().is_bound());
    }

    #[test]
    fn test_with_buffers() {
        let buffers = GeometryBuffers {
            vertex_buffer_address: 0x2000,
            vertex_byte_stride: 32,
            index_buffer_address: 0x8000,
        };
        let geometry = MeshGeometry::new("shapeGeo").with_buffers(buffers);
        assert!(geometry.buffers().is_bound());
        assert_eq!(geometry.buffers().vertex_byte_stride, 32);
    }
}
