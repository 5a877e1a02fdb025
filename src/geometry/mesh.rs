//! 网格数据结构模块
//!
//! CPU 侧的网格数据容器，以及描述共享缓冲区中一段绘制范围的子网格。

use super::vertex::Vertex;

/// 子网格描述符
///
/// 多个物体的几何数据合并到同一对顶点/索引缓冲区时，
/// 用它记录每个物体在缓冲区中的范围。
///
/// # 示例
///
/// ```rust
/// use dx12_demos::geometry::SubmeshGeometry;
///
/// let box_submesh = SubmeshGeometry::new(36, 0, 0);
/// assert_eq!(box_submesh.index_count, 36);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmeshGeometry {
    /// 索引数量
    pub index_count: u32,

    /// 在索引缓冲区中的起始位置
    pub start_index_location: u32,

    /// 读取顶点前加到每个索引上的偏移
    pub base_vertex_location: i32,
}

impl SubmeshGeometry {
    #[inline]
    pub fn new(index_count: u32, start_index_location: u32, base_vertex_location: i32) -> Self {
        Self {
            index_count,
            start_index_location,
            base_vertex_location,
        }
    }

    /// 覆盖整个网格的子网格
    pub fn whole(mesh: &MeshData) -> Self {
        Self::new(mesh.indices32.len() as u32, 0, 0)
    }
}

/// 网格数据
///
/// 存储顶点和 32 位索引。上传前可以用 [`MeshData::indices16`] 转为 16 位索引。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// 顶点数组
    pub vertices: Vec<Vertex>,

    /// 索引数组（三角形列表，每三个索引构成一个三角形）
    pub indices32: Vec<u32>,
}

impl MeshData {
    /// 创建空的网格数据
    pub fn new() -> Self {
        Self::default()
    }

    /// 带预分配容量的网格数据
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            indices32: Vec::with_capacity(index_count),
        }
    }

    /// 16 位索引
    ///
    /// 超过 u16 范围的索引会被截断，调用方需保证顶点数不超过 65536。
    pub fn indices16(&self) -> Vec<u16> {
        self.indices32.iter().map(|&i| i as u16).collect()
    }

    /// 获取顶点数量
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// 获取三角形数量
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices32.len() / 3
    }

    /// 检查网格是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices32.is_empty()
    }

    /// 所有索引是否都指向有效顶点
    pub fn indices_in_range(&self) -> bool {
        let count = self.vertices.len() as u32;
        self.indices32.iter().all(|&i| i < count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> MeshData {
        MeshData {
            vertices: vec![Vertex::default(); 3],
            indices32: vec![0, 1, 2],
        }
    }

    #[test]
    fn test_mesh_data_empty() {
        let mesh = MeshData::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_mesh_data_counts() {
        let mesh = triangle();
        assert!(!mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.triangle_count(), 1);
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn test_indices16() {
        let mut mesh = triangle();
        mesh.indices32 = vec![2, 1, 0];
        assert_eq!(mesh.indices16(), vec![2u16, 1, 0]);
    }

    #[test]
    fn test_submesh_whole() {
        let submesh = SubmeshGeometry::whole(&triangle());
        assert_eq!(submesh, SubmeshGeometry::new(3, 0, 0));
    }
}
