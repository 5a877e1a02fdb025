//! 方块示例的场景数据
//!
//! 8 个顶点的彩色立方体，位置和颜色分两个顶点流上传。

use crate::component::{OrbitCamera, Projection};
use crate::core::InputSystem;
use crate::math::{Color, Matrix4};
use crate::renderer::{BoxGlobalConstants, BoxObjectConstants};

/// 立方体的 8 个角
pub const BOX_POSITIONS: [[f32; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, -1.0, -1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, 1.0],
    [1.0, 1.0, 1.0],
    [1.0, -1.0, 1.0],
];

/// 每个角的颜色
pub const BOX_COLORS: [Color; 8] = [
    Color::WHITE,
    Color::BLACK,
    Color::RED,
    Color::GREEN,
    Color::BLUE,
    Color::YELLOW,
    Color::CYAN,
    Color::MAGENTA,
];

/// 12 个三角形，顺时针为正面
#[rustfmt::skip]
pub const BOX_INDICES: [u16; 36] = [
    // 前面
    0, 1, 2,
    0, 2, 3,
    // 后面
    4, 6, 5,
    4, 7, 6,
    // 左面
    4, 5, 1,
    4, 1, 0,
    // 右面
    3, 2, 6,
    3, 6, 7,
    // 顶面
    1, 5, 6,
    1, 6, 2,
    // 底面
    4, 0, 3,
    4, 3, 7,
];

/// 方块场景
#[derive(Debug, Clone)]
pub struct BoxScene {
    camera: OrbitCamera,
    projection: Projection,
    world: Matrix4,
}

impl BoxScene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            camera: OrbitCamera::box_preset(),
            projection: Projection::from_size(width, height),
            world: Matrix4::identity(),
        }
    }

    /// 清屏颜色
    pub fn clear_color(&self) -> Color {
        Color::LIGHT_STEEL_BLUE
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.set_size(width, height);
    }

    /// 鼠标拖动控制相机；方块示例没有键盘开关
    pub fn handle_input(&mut self, input: &mut InputSystem) {
        input.update_camera(&mut self.camera);
        input.take_pressed_keys();
    }

    /// 位置流
    pub fn positions(&self) -> &'static [[f32; 3]] {
        &BOX_POSITIONS
    }

    /// 颜色流
    pub fn colors(&self) -> Vec<[f32; 4]> {
        BOX_COLORS.iter().map(Color::to_array).collect()
    }

    pub fn indices(&self) -> &'static [u16] {
        &BOX_INDICES
    }

    pub fn object_constants(&self, total_time: f32) -> BoxObjectConstants {
        let world_view_proj = self.projection.matrix() * self.camera.view_matrix() * self.world;
        BoxObjectConstants::new(&world_view_proj, total_time)
    }

    pub fn global_constants(&self, total_time: f32) -> BoxGlobalConstants {
        BoxGlobalConstants::new(total_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector4;

    #[test]
    fn test_indices_cover_all_vertices() {
        assert!(BOX_INDICES.iter().all(|&i| (i as usize) < BOX_POSITIONS.len()));
        for v in 0..8u16 {
            assert!(BOX_INDICES.contains(&v));
        }
    }

    #[test]
    fn test_colors() {
        let scene = BoxScene::new(800, 600);
        let colors = scene.colors();
        assert_eq!(colors.len(), 8);
        assert_eq!(colors[0], [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(colors[3], Color::GREEN.to_array());
        assert_eq!(scene.clear_color(), Color::LIGHT_STEEL_BLUE);
    }

    #[test]
    fn test_origin_projects_inside_clip_volume() {
        let scene = BoxScene::new(800, 600);
        let cb = scene.object_constants(1.5);
        assert_eq!(cb.current_time, 1.5);

        // 着色器矩阵按行存放 m 的行，还原为 m 再变换原点
        let m = Matrix4::from(cb.world_view_proj).transpose();
        let clip = m * Vector4::new(0.0, 0.0, 0.0, 1.0);
        let ndc_z = clip.z / clip.w;
        assert!(clip.w > 0.0);
        assert!((0.0..1.0).contains(&ndc_z));
        assert!((clip.x / clip.w).abs() < 1e-4);
    }

    #[test]
    fn test_global_constants() {
        let scene = BoxScene::new(1, 1);
        assert_eq!(scene.global_constants(2.0).global_time, 2.0);
    }
}
