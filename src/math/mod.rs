//! 数学库模块
//!
//! 基于 `nalgebra` 的类型别名与 DirectXMath 风格的辅助函数。
//!
//! # 约定
//!
//! - 矩阵使用 nalgebra 的列向量约定（`M * v`），组合顺序为 `proj * view * world`
//! - 所有投影与视图矩阵都是左手系，深度范围 [0, 1]
//! - 上传到着色器之前用 [`to_shader_matrix`] 转置，着色器中按 `mul(v, M)` 使用

use rand::Rng;

pub use nalgebra::{
    Matrix4 as Mat4, Point3, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4,
};

// 类型别名，使用更简洁的名称
pub type Vector2 = Vec2<f32>;
pub type Vector3 = Vec3<f32>;
pub type Vector4 = Vec4<f32>;
pub type Matrix4 = Mat4<f32>;

/// 颜色类型（RGBA，范围 0.0-1.0）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    /// 创建新的颜色
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// 创建 RGB 颜色（alpha = 1.0）
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// 转换为 `[f32; 4]`，用于清屏颜色和常量缓冲区
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// 转换为 Vector4
    pub fn to_vec4(&self) -> Vector4 {
        Vector4::new(self.r, self.g, self.b, self.a)
    }

    // 预定义颜色
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 0.501_960_8, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);
    pub const CYAN: Color = Color::rgb(0.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::rgb(1.0, 0.0, 1.0);
    pub const LIGHT_STEEL_BLUE: Color = Color::rgb(0.690_196_1, 0.768_627_5, 0.870_588_3);
}

/// 数学常量
pub mod constants {
    /// π
    pub const PI: f32 = std::f32::consts::PI;

    /// 角度转弧度的系数
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

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

/// 线性插值
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// [a, b) 区间内的随机浮点数
pub fn rand_f32(a: f32, b: f32) -> f32 {
    if b <= a {
        return a;
    }
    rand::thread_rng().gen_range(a..b)
}

/// [a, b] 区间内的随机整数
pub fn rand_i32(a: i32, b: i32) -> i32 {
    if b <= a {
        return a;
    }
    rand::thread_rng().gen_range(a..=b)
}

/// 球坐标转笛卡尔坐标（y 轴向上）
pub fn spherical_to_cartesian(radius: f32, theta: f32, phi: f32) -> Vector3 {
    Vector3::new(
        radius * phi.sin() * theta.cos(),
        radius * phi.cos(),
        radius * phi.sin() * theta.sin(),
    )
}

/// 创建平移矩阵
pub fn translation(x: f32, y: f32, z: f32) -> Matrix4 {
    Matrix4::new_translation(&Vector3::new(x, y, z))
}

/// 创建缩放矩阵
pub fn scaling(x: f32, y: f32, z: f32) -> Matrix4 {
    Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z))
}

/// 创建绕 Z 轴旋转的矩阵
pub fn rotation_z(angle: f32) -> Matrix4 {
    Matrix4::from_axis_angle(&Vector3::z_axis(), angle)
}

/// 左手系 Look-At 视图矩阵
///
/// 观察方向映射到 +Z。
pub fn look_at_lh(eye: &Vector3, target: &Vector3, up: &Vector3) -> Matrix4 {
    Matrix4::look_at_lh(&Point3::from(*eye), &Point3::from(*target), up)
}

/// 左手系透视投影矩阵，深度映射到 [0, 1]
///
/// 与 `XMMatrixPerspectiveFovLH` 等价（转置后）。
pub fn perspective_fov_lh(fov_y: f32, aspect: f32, near_z: f32, far_z: f32) -> Matrix4 {
    let h = 1.0 / (0.5 * fov_y).tan();
    let w = h / aspect;
    let range = far_z / (far_z - near_z);

    #[rustfmt::skip]
    let proj = Matrix4::new(
        w,   0.0, 0.0,   0.0,
        0.0, h,   0.0,   0.0,
        0.0, 0.0, range, -range * near_z,
        0.0, 0.0, 1.0,   0.0,
    );
    proj
}

/// 转换为 HLSL 常量缓冲区布局
///
/// 结果按行存放 `m` 的各行；HLSL 默认按列主序读取，得到的正是 `m` 的转置，
/// 着色器里用 `mul(v, M)` 即可。
pub fn to_shader_matrix(m: &Matrix4) -> [[f32; 4]; 4] {
    m.transpose().into()
}

/// 求逆，不可逆时返回单位矩阵
pub fn inverse_or_identity(m: &Matrix4) -> Matrix4 {
    m.try_inverse().unwrap_or_else(Matrix4::identity)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_matrix_translation() {
        let mat = translation(1.0, 2.0, 3.0);
        let result = mat * Vector4::new(0.0, 0.0, 0.0, 1.0);

        assert!((result.x - 1.0).abs() < EPS);
        assert!((result.y - 2.0).abs() < EPS);
        assert!((result.z - 3.0).abs() < EPS);
    }

    #[test]
    fn test_look_at_lh_maps_target_to_positive_z() {
        let eye = Vector3::new(0.0, 0.0, -5.0);
        let view = look_at_lh(&eye, &Vector3::zeros(), &Vector3::y());
        let p = view * Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((p.z - 5.0).abs() < EPS);
        assert!(p.x.abs() < EPS && p.y.abs() < EPS);
    }

    #[test]
    fn test_perspective_depth_range() {
        let proj = perspective_fov_lh(0.25 * constants::PI, 4.0 / 3.0, 1.0, 1000.0);

        let near = proj * Vector4::new(0.0, 0.0, 1.0, 1.0);
        assert!((near.z / near.w).abs() < EPS);

        let far = proj * Vector4::new(0.0, 0.0, 1000.0, 1.0);
        assert!((far.z / far.w - 1.0).abs() < EPS);
    }

    #[test]
    fn test_shader_matrix_is_transpose() {
        let m = translation(1.0, 2.0, 3.0);
        let rows = to_shader_matrix(&m);
        // HLSL 按列读取，平移落在着色器矩阵的第 4 行
        assert_eq!(rows[0], [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(rows[1], [0.0, 1.0, 0.0, 2.0]);
        assert_eq!(rows[3], [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_spherical_to_cartesian() {
        let p = spherical_to_cartesian(2.0, 0.0, constants::PI / 2.0);
        assert!((p.x - 2.0).abs() < EPS);
        assert!(p.y.abs() < EPS);
        assert!(p.z.abs() < EPS);
    }

    #[test]
    fn test_random_ranges() {
        for _ in 0..100 {
            let f = rand_f32(0.2, 0.5);
            assert!((0.2..0.5).contains(&f));
            let i = rand_i32(4, 123);
            assert!((4..=123).contains(&i));
        }
        assert_eq!(rand_i32(3, 3), 3);
    }

    #[test]
    fn test_clamp_and_lerp() {
        assert_eq!(clamp(5.0, 0.1, 3.0), 3.0);
        assert_eq!(clamp(-1, 0, 10), 0);
        assert!((lerp(0.0, 10.0, 0.25) - 2.5).abs() < EPS);
    }
}
