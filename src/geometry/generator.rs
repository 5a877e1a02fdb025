//! 程序化几何体生成
//!
//! 生成方块、网格、圆柱和屏幕四边形。所有几何体都以原点为中心，
//! 三角形为顺时针环绕（Direct3D 默认正面）。

use super::mesh::MeshData;
use super::vertex::Vertex;
use crate::math::{constants::PI, Vector3};

/// 方块最大细分次数
pub const MAX_BOX_SUBDIVISIONS: u32 = 6;

/// 几何体生成器
#[derive(Debug, Clone, Copy, Default)]
pub struct GeometryGenerator;

impl GeometryGenerator {
    /// 方块
    ///
    /// 每个面 4 个顶点（法线各不相同），共 24 个顶点、36 个索引；
    /// 之后每次细分把每个三角形拆成 4 个。
    pub fn create_box(width: f32, height: f32, depth: f32, num_subdivisions: u32) -> MeshData {
        let w2 = 0.5 * width;
        let h2 = 0.5 * height;
        let d2 = 0.5 * depth;

        #[rustfmt::skip]
        let vertices = vec![
            // 前面
            Vertex::from_components(-w2, -h2, -d2, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::from_components(-w2, h2, -d2, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 0.0, 0.0),
            Vertex::from_components(w2, h2, -d2, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 1.0, 0.0),
            Vertex::from_components(w2, -h2, -d2, 0.0, 0.0, -1.0, 1.0, 0.0, 0.0, 1.0, 1.0),
            // 后面
            Vertex::from_components(-w2, -h2, d2, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 1.0),
            Vertex::from_components(w2, -h2, d2, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::from_components(w2, h2, d2, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 0.0, 0.0),
            Vertex::from_components(-w2, h2, d2, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0),
            // 顶面
            Vertex::from_components(-w2, h2, -d2, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::from_components(-w2, h2, d2, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0),
            Vertex::from_components(w2, h2, d2, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0),
            Vertex::from_components(w2, h2, -d2, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0),
            // 底面
            Vertex::from_components(-w2, -h2, -d2, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 1.0),
            Vertex::from_components(w2, -h2, -d2, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 1.0),
            Vertex::from_components(w2, -h2, d2, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0),
            Vertex::from_components(-w2, -h2, d2, 0.0, -1.0, 0.0, -1.0, 0.0, 0.0, 1.0, 0.0),
            // 左面
            Vertex::from_components(-w2, -h2, d2, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 1.0),
            Vertex::from_components(-w2, h2, d2, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 0.0, 0.0),
            Vertex::from_components(-w2, h2, -d2, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0, 0.0),
            Vertex::from_components(-w2, -h2, -d2, -1.0, 0.0, 0.0, 0.0, 0.0, -1.0, 1.0, 1.0),
            // 右面
            Vertex::from_components(w2, -h2, -d2, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0),
            Vertex::from_components(w2, h2, -d2, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0),
            Vertex::from_components(w2, h2, d2, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0),
            Vertex::from_components(w2, -h2, d2, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0),
        ];

        let indices32 = (0..6u32)
            .flat_map(|face| [0, 1, 2, 0, 2, 3].map(|i| face * 4 + i))
            .collect();

        let mut mesh = MeshData {
            vertices,
            indices32,
        };

        for _ in 0..num_subdivisions.min(MAX_BOX_SUBDIVISIONS) {
            Self::subdivide(&mut mesh);
        }

        mesh
    }

    /// 把每个三角形拆成 4 个
    ///
    /// ```text
    ///       v1
    ///       *
    ///      / \
    ///  m0 *---* m1
    ///    / \ / \
    ///   *---*---*
    ///  v0   m2   v2
    /// ```
    ///
    /// 顶点不共享，每个三角形输出 6 个顶点。
    pub fn subdivide(mesh: &mut MeshData) {
        let input = std::mem::take(mesh);
        let triangle_count = input.triangle_count();
        *mesh = MeshData::with_capacity(triangle_count * 6, triangle_count * 12);

        for (i, tri) in input.indices32.chunks_exact(3).enumerate() {
            let v0 = input.vertices[tri[0] as usize];
            let v1 = input.vertices[tri[1] as usize];
            let v2 = input.vertices[tri[2] as usize];

            let m0 = Self::mid_point(&v0, &v1);
            let m1 = Self::mid_point(&v1, &v2);
            let m2 = Self::mid_point(&v0, &v2);

            mesh.vertices.extend_from_slice(&[v0, v1, v2, m0, m1, m2]);

            let base = i as u32 * 6;
            mesh.indices32.extend(
                [0, 3, 5, 3, 4, 5, 5, 4, 2, 3, 1, 4].map(|offset| base + offset),
            );
        }
    }

    /// 两个顶点的中点；法线与切线重新归一化
    fn mid_point(a: &Vertex, b: &Vertex) -> Vertex {
        let avg3 = |x: [f32; 3], y: [f32; 3]| Vector3::from(x).lerp(&Vector3::from(y), 0.5);
        let normal = avg3(a.normal, b.normal).normalize();
        let tangent = avg3(a.tangent_u, b.tangent_u).normalize();

        Vertex::new(
            avg3(a.position, b.position).into(),
            normal.into(),
            tangent.into(),
            [
                0.5 * (a.texcoord[0] + b.texcoord[0]),
                0.5 * (a.texcoord[1] + b.texcoord[1]),
            ],
        )
    }

    /// xz 平面上的网格
    ///
    /// `m` 行 `n` 列顶点，纹理坐标覆盖 [0, 1]。
    pub fn create_grid(width: f32, depth: f32, m: u32, n: u32) -> MeshData {
        if m < 2 || n < 2 {
            return MeshData::new();
        }

        let vertex_count = (m * n) as usize;
        let face_count = ((m - 1) * (n - 1) * 2) as usize;
        let mut mesh = MeshData::with_capacity(vertex_count, face_count * 3);

        let half_width = 0.5 * width;
        let half_depth = 0.5 * depth;

        let dx = width / (n - 1) as f32;
        let dz = depth / (m - 1) as f32;
        let du = 1.0 / (n - 1) as f32;
        let dv = 1.0 / (m - 1) as f32;

        for i in 0..m {
            let z = half_depth - i as f32 * dz;
            for j in 0..n {
                let x = -half_width + j as f32 * dx;
                mesh.vertices.push(Vertex::new(
                    [x, 0.0, z],
                    [0.0, 1.0, 0.0],
                    [1.0, 0.0, 0.0],
                    [j as f32 * du, i as f32 * dv],
                ));
            }
        }

        for i in 0..m - 1 {
            for j in 0..n - 1 {
                mesh.indices32.extend_from_slice(&[
                    i * n + j,
                    i * n + j + 1,
                    (i + 1) * n + j,
                    (i + 1) * n + j,
                    i * n + j + 1,
                    (i + 1) * n + j + 1,
                ]);
            }
        }

        mesh
    }

    /// 带上下底面的圆柱（底面半径与顶面半径可以不同）
    pub fn create_cylinder(
        bottom_radius: f32,
        top_radius: f32,
        height: f32,
        slice_count: u32,
        stack_count: u32,
    ) -> MeshData {
        let mut mesh =
            Self::create_open_cylinder(bottom_radius, top_radius, height, slice_count, stack_count);
        if mesh.is_empty() {
            return mesh;
        }

        Self::build_cylinder_cap(&mut mesh, top_radius, 0.5 * height, height, slice_count, true);
        Self::build_cylinder_cap(&mut mesh, bottom_radius, -0.5 * height, height, slice_count, false);
        mesh
    }

    /// 只有侧面的圆柱
    ///
    /// 沿高度切成 `stack_count` 层，每个环有 `slice_count + 1` 个顶点
    /// （首尾重复，纹理坐标才能正确接缝）。
    pub fn create_open_cylinder(
        bottom_radius: f32,
        top_radius: f32,
        height: f32,
        slice_count: u32,
        stack_count: u32,
    ) -> MeshData {
        if slice_count < 3 || stack_count < 1 {
            return MeshData::new();
        }

        let ring_count = stack_count + 1;
        let ring_vertex_count = slice_count + 1;
        let mut mesh = MeshData::with_capacity(
            (ring_count * ring_vertex_count) as usize,
            (stack_count * slice_count * 6) as usize,
        );

        let stack_height = height / stack_count as f32;
        let radius_step = (top_radius - bottom_radius) / stack_count as f32;
        let d_theta = 2.0 * PI / slice_count as f32;
        let dr = bottom_radius - top_radius;

        for i in 0..ring_count {
            let y = -0.5 * height + i as f32 * stack_height;
            let r = bottom_radius + i as f32 * radius_step;

            for j in 0..=slice_count {
                let (s, c) = (j as f32 * d_theta).sin_cos();

                let tangent = Vector3::new(-s, 0.0, c);
                let bitangent = Vector3::new(dr * c, -height, dr * s);
                let normal = tangent.cross(&bitangent).normalize();

                mesh.vertices.push(Vertex::new(
                    [r * c, y, r * s],
                    normal.into(),
                    tangent.into(),
                    [
                        j as f32 / slice_count as f32,
                        1.0 - i as f32 / stack_count as f32,
                    ],
                ));
            }
        }

        for i in 0..stack_count {
            for j in 0..slice_count {
                mesh.indices32.extend_from_slice(&[
                    i * ring_vertex_count + j,
                    (i + 1) * ring_vertex_count + j,
                    (i + 1) * ring_vertex_count + j + 1,
                    i * ring_vertex_count + j,
                    (i + 1) * ring_vertex_count + j + 1,
                    i * ring_vertex_count + j + 1,
                ]);
            }
        }

        mesh
    }

    fn build_cylinder_cap(
        mesh: &mut MeshData,
        radius: f32,
        y: f32,
        height: f32,
        slice_count: u32,
        top: bool,
    ) {
        let base_index = mesh.vertices.len() as u32;
        let d_theta = 2.0 * PI / slice_count as f32;
        let ny = if top { 1.0 } else { -1.0 };

        // 纹理坐标按高度缩放，与侧面的比例一致
        for i in 0..=slice_count {
            let (s, c) = (i as f32 * d_theta).sin_cos();
            let x = radius * c;
            let z = radius * s;

            mesh.vertices.push(Vertex::new(
                [x, y, z],
                [0.0, ny, 0.0],
                [1.0, 0.0, 0.0],
                [x / height + 0.5, z / height + 0.5],
            ));
        }

        mesh.vertices.push(Vertex::new(
            [0.0, y, 0.0],
            [0.0, ny, 0.0],
            [1.0, 0.0, 0.0],
            [0.5, 0.5],
        ));
        let center_index = mesh.vertices.len() as u32 - 1;

        for i in 0..slice_count {
            let (a, b) = if top {
                (base_index + i + 1, base_index + i)
            } else {
                (base_index + i, base_index + i + 1)
            };
            mesh.indices32.extend_from_slice(&[center_index, a, b]);
        }
    }

    /// 屏幕四边形
    ///
    /// `(x, y)` 是左上角，坐标直接以 NDC 给出。
    /// `create_quad(-1.0, 1.0, 2.0, 2.0, 0.0)` 覆盖整个屏幕。
    pub fn create_quad(x: f32, y: f32, w: f32, h: f32, depth: f32) -> MeshData {
        let normal = [0.0, 0.0, -1.0];
        let tangent = [1.0, 0.0, 0.0];

        MeshData {
            vertices: vec![
                Vertex::new([x, y - h, depth], normal, tangent, [0.0, 1.0]),
                Vertex::new([x, y, depth], normal, tangent, [0.0, 0.0]),
                Vertex::new([x + w, y, depth], normal, tangent, [1.0, 0.0]),
                Vertex::new([x + w, y - h, depth], normal, tangent, [1.0, 1.0]),
            ],
            indices32: vec![0, 1, 2, 0, 2, 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn length(v: [f32; 3]) -> f32 {
        Vector3::from(v).norm()
    }

    #[test]
    fn test_box_counts() {
        let mesh = GeometryGenerator::create_box(1.0, 1.0, 1.0, 0);
        assert_eq!(mesh.vertex_count(), 24);
        assert_eq!(mesh.indices32.len(), 36);
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn test_box_extents() {
        let mesh = GeometryGenerator::create_box(2.0, 4.0, 6.0, 0);
        for v in &mesh.vertices {
            assert!((v.position[0].abs() - 1.0).abs() < EPS);
            assert!((v.position[1].abs() - 2.0).abs() < EPS);
            assert!((v.position[2].abs() - 3.0).abs() < EPS);
        }
    }

    #[test]
    fn test_box_subdivision() {
        let mesh = GeometryGenerator::create_box(1.0, 1.0, 1.0, 1);
        // 12 个三角形，每个拆成 4 个
        assert_eq!(mesh.triangle_count(), 48);
        assert_eq!(mesh.vertex_count(), 72);
        assert!(mesh.indices_in_range());

        let three = GeometryGenerator::create_box(8.0, 8.0, 8.0, 3);
        assert_eq!(three.triangle_count(), 12 * 4 * 4 * 4);
        for v in &three.vertices {
            assert!((length(v.normal) - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn test_box_subdivision_is_capped() {
        let capped = GeometryGenerator::create_box(1.0, 1.0, 1.0, 100);
        let six = GeometryGenerator::create_box(1.0, 1.0, 1.0, MAX_BOX_SUBDIVISIONS);
        assert_eq!(capped.triangle_count(), six.triangle_count());
    }

    #[test]
    fn test_grid() {
        let mesh = GeometryGenerator::create_grid(160.0, 160.0, 50, 50);
        assert_eq!(mesh.vertex_count(), 2500);
        assert_eq!(mesh.indices32.len(), 49 * 49 * 6);
        assert!(mesh.indices_in_range());

        let first = mesh.vertices[0];
        assert_eq!(first.position, [-80.0, 0.0, 80.0]);
        assert_eq!(first.texcoord, [0.0, 0.0]);

        let last = mesh.vertices[2499];
        assert!((last.position[0] - 80.0).abs() < EPS);
        assert!((last.position[2] + 80.0).abs() < EPS);
        assert!((last.texcoord[0] - 1.0).abs() < EPS);
        assert!((last.texcoord[1] - 1.0).abs() < EPS);
    }

    #[test]
    fn test_degenerate_grid_is_empty() {
        assert!(GeometryGenerator::create_grid(1.0, 1.0, 1, 5).is_empty());
    }

    #[test]
    fn test_open_cylinder() {
        let mesh = GeometryGenerator::create_open_cylinder(2.0, 2.0, 10.0, 20, 10);
        assert_eq!(mesh.vertex_count(), 11 * 21);
        assert_eq!(mesh.indices32.len(), 10 * 20 * 6);
        assert!(mesh.indices_in_range());

        // 等半径圆柱的侧面法线水平朝外
        for v in &mesh.vertices {
            assert!(v.normal[1].abs() < EPS);
            let outward = v.position[0] * v.normal[0] + v.position[2] * v.normal[2];
            assert!(outward > 0.0);
        }
    }

    #[test]
    fn test_cylinder_caps() {
        let open = GeometryGenerator::create_open_cylinder(1.0, 0.5, 3.0, 12, 4);
        let closed = GeometryGenerator::create_cylinder(1.0, 0.5, 3.0, 12, 4);

        // 每个底面：slice_count + 1 个环顶点和 1 个中心点
        assert_eq!(closed.vertex_count(), open.vertex_count() + 2 * 14);
        assert_eq!(closed.triangle_count(), open.triangle_count() + 2 * 12);
        assert!(closed.indices_in_range());

        let top_center = closed.vertices[open.vertex_count() + 13];
        assert_eq!(top_center.position, [0.0, 1.5, 0.0]);
        assert_eq!(top_center.normal, [0.0, 1.0, 0.0]);
        let bottom_center = closed.vertices[closed.vertex_count() - 1];
        assert_eq!(bottom_center.position, [0.0, -1.5, 0.0]);
    }

    #[test]
    fn test_full_screen_quad() {
        let quad = GeometryGenerator::create_quad(-1.0, 1.0, 2.0, 2.0, 0.0);
        assert_eq!(quad.vertex_count(), 4);
        assert_eq!(quad.indices32, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(quad.vertices[0].position, [-1.0, -1.0, 0.0]);
        assert_eq!(quad.vertices[2].position, [1.0, 1.0, 0.0]);
        assert_eq!(quad.vertices[3].texcoord, [1.0, 1.0]);
    }
}
