//! 顶点定义模块
//!
//! 几何体生成器输出的完整顶点，以及各示例上传到 GPU 的精简顶点格式。

use bytemuck::{Pod, Zeroable};

/// 几何体生成器输出的顶点
///
/// 包含位置、法线、切线和纹理坐标，各示例按需转换为自己的顶点格式。
///
/// # 内存布局
///
/// - position: 12 bytes (3 * f32)
/// - normal: 12 bytes (3 * f32)
/// - tangent_u: 12 bytes (3 * f32)
/// - texcoord: 8 bytes (2 * f32)
/// - **总计**: 44 bytes
///
/// # 示例
///
/// ```rust
/// use dx12_demos::geometry::Vertex;
///
/// let vertex = Vertex::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.5]);
/// assert_eq!(vertex.texcoord, [0.5, 0.5]);
/// ```
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// 顶点位置 (x, y, z)
    pub position: [f32; 3],

    /// 法线向量 (nx, ny, nz)
    ///
    /// 用于光照计算的表面法线，应该是归一化的单位向量。
    pub normal: [f32; 3],

    /// 沿纹理 u 方向的切线
    pub tangent_u: [f32; 3],

    /// 纹理坐标 (u, v)
    pub texcoord: [f32; 2],
}

impl Vertex {
    /// 创建一个新的顶点
    #[inline]
    pub fn new(
        position: [f32; 3],
        normal: [f32; 3],
        tangent_u: [f32; 3],
        texcoord: [f32; 2],
    ) -> Self {
        Self {
            position,
            normal,
            tangent_u,
            texcoord,
        }
    }

    /// 逐分量展开的构造函数，参数顺序为位置、法线、切线、纹理坐标
    #[allow(clippy::too_many_arguments)]
    #[inline]
    pub(crate) fn from_components(
        px: f32, py: f32, pz: f32,
        nx: f32, ny: f32, nz: f32,
        tx: f32, ty: f32, tz: f32,
        u: f32, v: f32,
    ) -> Self {
        Self::new([px, py, pz], [nx, ny, nz], [tx, ty, tz], [u, v])
    }
}

/// 位置 + 法线 + 纹理坐标顶点，箱子和混合示例使用
///
/// 对应输入布局 `POSITION`(0) / `NORMAL`(12) / `TEXCOORD`(24)。
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct TexVertex {
    pub pos: [f32; 3],
    pub normal: [f32; 3],
    pub tex_c: [f32; 2],
}

impl TexVertex {
    pub const POSITION_OFFSET: u32 = 0;
    pub const NORMAL_OFFSET: u32 = 12;
    pub const TEXCOORD_OFFSET: u32 = 24;
}

impl From<&Vertex> for TexVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            pos: v.position,
            normal: v.normal,
            tex_c: v.texcoord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::{align_of, size_of};

    #[test]
    fn test_vertex_size() {
        // 3*4 + 3*4 + 3*4 + 2*4 = 44 bytes
        assert_eq!(size_of::<Vertex>(), 44);
        assert_eq!(align_of::<Vertex>(), 4);
    }

    #[test]
    fn test_render_vertex_sizes() {
        assert_eq!(size_of::<TexVertex>(), 32);
        assert_eq!(TexVertex::TEXCOORD_OFFSET as usize, size_of::<[f32; 6]>());
    }

    #[test]
    fn test_tex_vertex_from_vertex() {
        let vertex = Vertex::new(
            [1.0, 2.0, 3.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.25, 0.75],
        );
        let tex = TexVertex::from(&vertex);

        assert_eq!(tex.pos, [1.0, 2.0, 3.0]);
        assert_eq!(tex.normal, [0.0, 1.0, 0.0]);
        assert_eq!(tex.tex_c, [0.25, 0.75]);
    }

    #[test]
    fn test_vertex_default() {
        let vertex = Vertex::default();
        assert_eq!(vertex.position, [0.0, 0.0, 0.0]);
        assert_eq!(vertex.tangent_u, [0.0, 0.0, 0.0]);
    }
}
