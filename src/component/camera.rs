//! Camera 组件
//!
//! 围绕原点旋转的轨道相机，用球坐标 (theta, phi, radius) 描述相机位置。
//! 投影矩阵单独放在 [`Projection`] 中，窗口尺寸变化时重建。

use crate::math::{self, constants::{DEG_TO_RAD, PI}, Matrix4, Vector3};

/// 每像素对应的旋转角度（度）
pub const DEGREES_PER_PIXEL: f32 = 0.25;

/// phi 的下限，避免相机越过极点
const MIN_PHI: f32 = 0.1;

/// 轨道相机
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// 方位角（弧度）
    theta: f32,

    /// 极角（弧度），限制在 [0.1, π - 0.1]
    phi: f32,

    /// 到原点的距离
    radius: f32,

    /// 半径下限
    min_radius: f32,

    /// 半径上限
    max_radius: f32,

    /// 缩放时每像素的半径变化量
    zoom_per_pixel: f32,
}

impl OrbitCamera {
    /// 创建相机，缩放参数默认为 0.005/像素，半径范围 [3, 15]
    pub fn new(theta: f32, phi: f32, radius: f32) -> Self {
        Self {
            theta,
            phi: math::clamp(phi, MIN_PHI, PI - MIN_PHI),
            radius,
            min_radius: 3.0,
            max_radius: 15.0,
            zoom_per_pixel: 0.005,
        }
    }

    /// 设置缩放参数
    pub fn with_zoom(mut self, zoom_per_pixel: f32, min_radius: f32, max_radius: f32) -> Self {
        self.zoom_per_pixel = zoom_per_pixel;
        self.min_radius = min_radius;
        self.max_radius = max_radius;
        self.radius = math::clamp(self.radius, min_radius, max_radius);
        self
    }

    /// Box 示例的相机
    pub fn box_preset() -> Self {
        Self::new(1.5 * PI, 0.25 * PI, 5.0).with_zoom(0.005, 3.0, 15.0)
    }

    /// Crate 示例的相机
    pub fn crate_preset() -> Self {
        Self::new(1.3 * PI, 0.4 * PI, 5.0).with_zoom(0.05, 5.0, 150.0)
    }

    /// Blend 示例的相机
    pub fn blend_preset() -> Self {
        Self::new(1.5 * PI, 0.5 * PI - 0.1, 50.0).with_zoom(0.2, 5.0, 150.0)
    }

    /// 按鼠标拖动的像素数旋转
    pub fn rotate(&mut self, dx_px: f32, dy_px: f32) {
        self.theta += DEGREES_PER_PIXEL * DEG_TO_RAD * dx_px;
        self.phi += DEGREES_PER_PIXEL * DEG_TO_RAD * dy_px;
        self.phi = math::clamp(self.phi, MIN_PHI, PI - MIN_PHI);
    }

    /// 按鼠标拖动的像素数缩放
    pub fn zoom(&mut self, dx_px: f32, dy_px: f32) {
        let dx = self.zoom_per_pixel * dx_px;
        let dy = self.zoom_per_pixel * dy_px;
        self.radius = math::clamp(self.radius + dx - dy, self.min_radius, self.max_radius);
    }

    /// 相机的世界坐标
    pub fn eye_position(&self) -> Vector3 {
        math::spherical_to_cartesian(self.radius, self.theta, self.phi)
    }

    /// 看向原点的视图矩阵
    pub fn view_matrix(&self) -> Matrix4 {
        math::look_at_lh(&self.eye_position(), &Vector3::zeros(), &Vector3::y())
    }

    pub fn theta(&self) -> f32 {
        self.theta
    }

    pub fn phi(&self) -> f32 {
        self.phi
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }
}

/// 透视投影参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    pub fov_y: f32,
    pub aspect: f32,
    pub near_z: f32,
    pub far_z: f32,
}

impl Projection {
    /// FOV = 45°，near = 1，far = 1000
    pub fn new(aspect: f32) -> Self {
        Self {
            fov_y: 0.25 * PI,
            aspect,
            near_z: 1.0,
            far_z: 1000.0,
        }
    }

    /// 根据客户区尺寸创建
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(aspect_ratio(width, height))
    }

    /// 窗口尺寸变化时更新宽高比
    pub fn set_size(&mut self, width: u32, height: u32) {
        self.aspect = aspect_ratio(width, height);
    }

    /// 投影矩阵
    pub fn matrix(&self) -> Matrix4 {
        math::perspective_fov_lh(self.fov_y, self.aspect, self.near_z, self.far_z)
    }
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_rotate_clamps_phi() {
        let mut camera = OrbitCamera::box_preset();
        camera.rotate(0.0, -10_000.0);
        assert!((camera.phi() - 0.1).abs() < EPS);

        camera.rotate(0.0, 100_000.0);
        assert!((camera.phi() - (PI - 0.1)).abs() < EPS);
    }

    #[test]
    fn test_rotate_quarter_degree_per_pixel() {
        let mut camera = OrbitCamera::crate_preset();
        let theta = camera.theta();
        camera.rotate(4.0, 0.0);
        assert!((camera.theta() - theta - DEG_TO_RAD).abs() < EPS);
    }

    #[test]
    fn test_zoom_clamps_radius() {
        let mut camera = OrbitCamera::crate_preset();
        camera.zoom(10.0, 0.0);
        assert!((camera.radius() - 5.5).abs() < EPS);

        camera.zoom(0.0, 1000.0);
        assert!((camera.radius() - 5.0).abs() < EPS);

        camera.zoom(100_000.0, 0.0);
        assert!((camera.radius() - 150.0).abs() < EPS);
    }

    #[test]
    fn test_eye_position_and_view() {
        let camera = OrbitCamera::box_preset();
        let eye = camera.eye_position();
        assert!((eye.norm() - 5.0).abs() < EPS);
        // theta = 1.5π 时相机位于 -Z 一侧
        assert!(eye.z < 0.0);
        assert!(eye.x.abs() < EPS);

        let origin = camera.view_matrix() * crate::math::Vector4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.z - 5.0).abs() < EPS);
    }

    #[test]
    fn test_projection_resize() {
        let mut proj = Projection::from_size(800, 600);
        assert!((proj.aspect - 4.0 / 3.0).abs() < EPS);

        proj.set_size(1920, 0);
        assert!((proj.aspect - 1920.0).abs() < EPS);
    }
}
