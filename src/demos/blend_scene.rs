//! 混合示例的场景数据
//!
//! 山地、波动的水面、铁丝网箱子和一根播放序列帧动画的闪电柱。
//! 水面顶点每帧在 CPU 上重建；透明、alpha 测试和加法混合各占一个渲染层。
//!
//! 另有一个像素重绘模式：各层只写模板缓冲（INCR_SAT），
//! 随后把模板值拷贝到纹理，用全屏四边形按重绘次数着色。

use winit::keyboard::KeyCode;

use crate::component::{three_point_lights, OrbitCamera, Projection};
use crate::core::{GameTimer, InputSystem};
use crate::geometry::{GeometryGenerator, MeshData, SubmeshGeometry, TexVertex, Waves};
use crate::math::{rand_f32, rand_i32, scaling, translation, Color, Vector3, Vector4};
use crate::renderer::texture::BOLT_FRAME_COUNT;
use crate::renderer::{Material, PassConstants, RenderItem, RenderLayer, RenderLayers};
use crate::app_info;

/// SRV 堆开头的三张静态纹理
pub const BLEND_TEXTURES: [&str; 3] = ["grass.dds", "water1.dds", "WireFence.dds"];

/// 闪电动画第一帧在 SRV 堆中的位置
pub const BOLT_SRV_OFFSET: usize = BLEND_TEXTURES.len();

/// 像素重绘纹理的 SRV 位置，紧跟在闪电动画帧之后
pub const OVERDRAW_SRV_INDEX: usize = BOLT_SRV_OFFSET + BOLT_FRAME_COUNT;

/// SRV 堆大小
pub const SRV_HEAP_SIZE: usize = OVERDRAW_SRV_INDEX + 1;

pub const WATER_ITEM: usize = 0;
pub const LAND_ITEM: usize = 1;
pub const BOX_ITEM: usize = 2;
pub const BOLT_ITEM: usize = 3;

/// 闪电动画帧率
const BOLT_FPS: f32 = 30.0;

/// 随机扰动水面的间隔（秒）
const WAVE_DISTURB_INTERVAL: f32 = 0.25;

/// 水面纹理滚动速度（每秒）
const WATER_SCROLL_U: f32 = 0.1;
const WATER_SCROLL_V: f32 = 0.02;

/// 雾
pub const FOG_COLOR: Color = Color::new(0.7, 0.7, 0.7, 1.0);
pub const FOG_START: f32 = 5.0;
pub const FOG_RANGE: f32 = 150.0;

/// 绘制模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Normal,
    PixelOverdraw,
}

/// 山地高度
pub fn hills_height(x: f32, z: f32) -> f32 {
    0.3 * (z * (0.1 * x).sin() + x * (0.1 * z).cos())
}

/// 山地高度函数的解析法线
pub fn hills_normal(x: f32, z: f32) -> Vector3 {
    Vector3::new(
        -0.03 * z * (0.1 * x).cos() - 0.3 * (0.1 * z).cos(),
        1.0,
        -0.3 * (0.1 * x).sin() + 0.03 * x * (0.1 * z).sin(),
    )
    .normalize()
}

/// 混合场景
#[derive(Debug, Clone)]
pub struct BlendScene {
    camera: OrbitCamera,
    projection: Projection,
    materials: Vec<Material>,
    items: Vec<RenderItem>,
    layers: RenderLayers,
    waves: Waves,
    land_mesh: MeshData,
    box_mesh: MeshData,
    bolt_mesh: MeshData,
    draw_mode: DrawMode,
    transparent_first: bool,
    wave_time_base: f32,
    bolt_last_update: Option<f32>,
}

impl BlendScene {
    pub fn new(width: u32, height: u32) -> Self {
        let waves = Waves::new(128, 128, 1.0, 0.03, 4.0, 0.2);

        let mut land_mesh = GeometryGenerator::create_grid(160.0, 160.0, 50, 50);
        for v in &mut land_mesh.vertices {
            let (x, z) = (v.position[0], v.position[2]);
            v.position[1] = hills_height(x, z);
            v.normal = hills_normal(x, z).into();
        }

        let box_mesh = GeometryGenerator::create_box(8.0, 8.0, 8.0, 3);
        let bolt_mesh = GeometryGenerator::create_open_cylinder(2.0, 2.0, 10.0, 20, 10);

        let materials = vec![
            Material::new("grass", 0, 0)
                .with_fresnel(0.01)
                .with_roughness(0.125),
            Material::new("water", 1, 1)
                .with_albedo(Vector4::new(1.0, 1.0, 1.0, 0.5))
                .with_fresnel(0.1)
                .with_roughness(0.0),
            Material::new("wirefence", 2, 2)
                .with_fresnel(0.1)
                .with_roughness(0.25),
            Material::new("boltAnim", 3, BOLT_SRV_OFFSET)
                .with_fresnel(0.1)
                .with_roughness(0.0),
        ];

        let water_submesh = SubmeshGeometry::new((waves.triangle_count() * 3) as u32, 0, 0);
        let items = vec![
            RenderItem::new(WATER_ITEM, "water", "waterGeo", water_submesh)
                .with_tex_transform(scaling(5.0, 5.0, 1.0)),
            RenderItem::new(LAND_ITEM, "grass", "landGeo", SubmeshGeometry::whole(&land_mesh))
                .with_tex_transform(scaling(5.0, 5.0, 1.0)),
            RenderItem::new(BOX_ITEM, "wirefence", "boxGeo", SubmeshGeometry::whole(&box_mesh))
                .with_world(translation(3.0, 2.0, -9.0)),
            RenderItem::new(BOLT_ITEM, "boltAnim", "boltGeo", SubmeshGeometry::whole(&bolt_mesh))
                .with_world(translation(3.0, 11.0, -9.0))
                .with_tex_transform(scaling(1.0, 4.0, 1.0)),
        ];

        let mut layers = RenderLayers::new();
        layers.push(RenderLayer::Transparent, WATER_ITEM);
        layers.push(RenderLayer::Opaque, LAND_ITEM);
        layers.push(RenderLayer::AlphaTested, BOX_ITEM);
        layers.push(RenderLayer::AnimatedBolt, BOLT_ITEM);

        Self {
            camera: OrbitCamera::blend_preset(),
            projection: Projection::from_size(width, height),
            materials,
            items,
            layers,
            waves,
            land_mesh,
            box_mesh,
            bolt_mesh,
            draw_mode: DrawMode::Normal,
            transparent_first: false,
            wave_time_base: 0.0,
            bolt_last_update: None,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// 清屏颜色与雾颜色相同
    pub fn clear_color(&self) -> Color {
        FOG_COLOR
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.set_size(width, height);
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn transparent_first(&self) -> bool {
        self.transparent_first
    }

    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [RenderItem] {
        &mut self.items
    }

    pub fn materials(&self) -> &[Material] {
        &self.materials
    }

    pub fn materials_mut(&mut self) -> &mut [Material] {
        &mut self.materials
    }

    /// 同时借出渲染项和材质，用于上传常量
    pub fn items_and_materials_mut(&mut self) -> (&mut [RenderItem], &mut [Material]) {
        (&mut self.items, &mut self.materials)
    }

    pub fn layers(&self) -> &RenderLayers {
        &self.layers
    }

    pub fn waves(&self) -> &Waves {
        &self.waves
    }

    pub fn land_mesh(&self) -> &MeshData {
        &self.land_mesh
    }

    pub fn box_mesh(&self) -> &MeshData {
        &self.box_mesh
    }

    pub fn bolt_mesh(&self) -> &MeshData {
        &self.bolt_mesh
    }

    /// 按名称查找材质
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name == name)
    }

    /// 各层的绘制顺序
    pub fn draw_order(&self) -> [RenderLayer; 4] {
        if self.transparent_first {
            [
                RenderLayer::Transparent,
                RenderLayer::AnimatedBolt,
                RenderLayer::Opaque,
                RenderLayer::AlphaTested,
            ]
        } else {
            [
                RenderLayer::Opaque,
                RenderLayer::AlphaTested,
                RenderLayer::Transparent,
                RenderLayer::AnimatedBolt,
            ]
        }
    }

    pub fn handle_input(&mut self, input: &mut InputSystem) {
        input.update_camera(&mut self.camera);
        for key in input.take_pressed_keys() {
            self.handle_key(key);
        }
    }

    /// 处理一次按键，返回按键是否被使用
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Digit1 => self.transparent_first = !self.transparent_first,
            KeyCode::F1 => self.draw_mode = DrawMode::Normal,
            KeyCode::F2 => self.draw_mode = DrawMode::PixelOverdraw,
            _ => return false,
        }

        app_info!(
            key = ?key,
            transparent_first = self.transparent_first,
            draw_mode = ?self.draw_mode,
            "Blend settings changed"
        );
        true
    }

    /// 每帧更新：材质动画与水面模拟
    pub fn update(&mut self, total_time: f32, delta_time: f32) {
        self.animate_materials(total_time, delta_time);
        self.update_waves(total_time, delta_time);
    }

    fn animate_materials(&mut self, total_time: f32, delta_time: f32) {
        if let Some(water) = self.materials.iter_mut().find(|m| m.name == "water") {
            let tu = &mut water.mat_transform[(0, 3)];
            *tu += WATER_SCROLL_U * delta_time;
            if *tu >= 1.0 {
                *tu -= 1.0;
            }

            let tv = &mut water.mat_transform[(1, 3)];
            *tv += WATER_SCROLL_V * delta_time;
            if *tv >= 1.0 {
                *tv -= 1.0;
            }

            water.mark_dirty();
        }

        // SRV 索引只在绘制时使用，不需要重新上传常量
        let last = *self.bolt_last_update.get_or_insert(total_time);
        if total_time - last >= 1.0 / BOLT_FPS {
            if let Some(bolt) = self.materials.iter_mut().find(|m| m.name == "boltAnim") {
                bolt.diffuse_srv_heap_index = next_bolt_frame(bolt.diffuse_srv_heap_index);
            }
            self.bolt_last_update = Some(total_time);
        }
    }

    fn update_waves(&mut self, total_time: f32, delta_time: f32) {
        if total_time - self.wave_time_base >= WAVE_DISTURB_INTERVAL {
            self.wave_time_base += WAVE_DISTURB_INTERVAL;

            let i = rand_i32(4, self.waves.row_count() as i32 - 5) as usize;
            let j = rand_i32(4, self.waves.column_count() as i32 - 5) as usize;
            let magnitude = rand_f32(0.2, 0.5);
            self.waves.disturb(i, j, magnitude);
        }

        self.waves.update(delta_time);
    }

    /// 当前水面的顶点，写入本帧的动态顶点缓冲
    pub fn water_vertices(&self) -> Vec<TexVertex> {
        let width = self.waves.width();
        let depth = self.waves.depth();

        (0..self.waves.vertex_count())
            .map(|i| {
                let pos = self.waves.position(i);
                TexVertex {
                    pos: pos.into(),
                    normal: self.waves.normal(i).into(),
                    tex_c: [0.5 + pos.x / width, 0.5 - pos.z / depth],
                }
            })
            .collect()
    }

    /// 水面网格的索引，与模拟网格的行列对应
    pub fn water_indices(&self) -> Vec<u16> {
        grid_indices_u16(self.waves.row_count(), self.waves.column_count())
    }

    pub fn pass_constants(&self, size: (u32, u32), timer: &GameTimer) -> PassConstants {
        PassConstants::build(&self.camera, &self.projection, size, timer)
            .with_ambient(Color::new(0.25, 0.25, 0.35, 1.0))
            .with_fog(FOG_COLOR, FOG_START, FOG_RANGE)
            .with_lights(&three_point_lights([0.9, 0.9, 0.8]))
    }
}

/// m×n 顶点网格的三角形索引（16 位）
///
/// 顶点数必须能用 u16 寻址。
pub fn grid_indices_u16(m: usize, n: usize) -> Vec<u16> {
    debug_assert!(
        m * n <= u16::MAX as usize + 1,
        "{}x{} grid does not fit 16-bit indices",
        m,
        n
    );

    let mut indices = Vec::with_capacity(m.saturating_sub(1) * n.saturating_sub(1) * 6);
    for i in 0..m.saturating_sub(1) {
        for j in 0..n.saturating_sub(1) {
            let a = (i * n + j) as u16;
            let b = (i * n + j + 1) as u16;
            let c = ((i + 1) * n + j) as u16;
            let d = ((i + 1) * n + j + 1) as u16;
            indices.extend_from_slice(&[a, b, c, c, b, d]);
        }
    }
    indices
}

/// 闪电动画的下一帧，在 `[BOLT_SRV_OFFSET, OVERDRAW_SRV_INDEX)` 内循环
pub fn next_bolt_frame(current: usize) -> usize {
    (current - BOLT_SRV_OFFSET + 1) % BOLT_FRAME_COUNT + BOLT_SRV_OFFSET
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_srv_layout() {
        assert_eq!(BOLT_SRV_OFFSET, 3);
        assert_eq!(OVERDRAW_SRV_INDEX, 63);
        assert_eq!(SRV_HEAP_SIZE, 64);
    }

    #[test]
    fn test_bolt_frames_wrap() {
        assert_eq!(next_bolt_frame(3), 4);
        assert_eq!(next_bolt_frame(61), 62);
        assert_eq!(next_bolt_frame(62), 3);
    }

    #[test]
    fn test_layers() {
        let scene = BlendScene::new(800, 600);
        assert_eq!(scene.layers().items(RenderLayer::Transparent), &[WATER_ITEM]);
        assert_eq!(scene.layers().items(RenderLayer::Opaque), &[LAND_ITEM]);
        assert_eq!(scene.layers().items(RenderLayer::AlphaTested), &[BOX_ITEM]);
        assert_eq!(scene.layers().items(RenderLayer::AnimatedBolt), &[BOLT_ITEM]);
        assert_eq!(scene.items()[BOX_ITEM].world[(1, 3)], 2.0);
        assert_eq!(scene.items()[BOLT_ITEM].tex_transform[(1, 1)], 4.0);
    }

    #[test]
    fn test_materials() {
        let scene = BlendScene::new(800, 600);
        let water = scene.material("water").unwrap();
        assert_eq!(water.mat_cb_index, 1);
        assert_eq!(water.diffuse_albedo.w, 0.5);
        assert_eq!(scene.material("grass").unwrap().roughness, 0.125);
        assert_eq!(scene.material("boltAnim").unwrap().diffuse_srv_heap_index, BOLT_SRV_OFFSET);
        assert!(scene.material("missing").is_none());
    }

    #[test]
    fn test_land_follows_hills() {
        let scene = BlendScene::new(800, 600);
        let land = scene.land_mesh();
        assert_eq!(land.vertex_count(), 2500);
        for v in land.vertices.iter().step_by(97) {
            let (x, z) = (v.position[0], v.position[2]);
            assert!((v.position[1] - hills_height(x, z)).abs() < EPS);
            let len: f32 = v.normal.iter().map(|c| c * c).sum::<f32>().sqrt();
            assert!((len - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_flat_hills_normal_points_up() {
        // 原点处梯度为 (0.3, 0)，法线向 -x 倾斜
        let n = hills_normal(0.0, 0.0);
        assert!(n.x < 0.0);
        assert!(n.y > 0.9);
        assert!(n.z.abs() < EPS);
    }

    #[test]
    fn test_water_geometry() {
        let scene = BlendScene::new(800, 600);
        let vertices = scene.water_vertices();
        let indices = scene.water_indices();
        assert_eq!(vertices.len(), 128 * 128);
        assert_eq!(indices.len(), scene.items()[WATER_ITEM].index_count as usize);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));

        // 第一个顶点在左上角 (-63.5, 0, 63.5)
        let first = vertices[0];
        assert!((first.tex_c[0] - (0.5 - 63.5 / 128.0)).abs() < EPS);
        assert!((first.tex_c[1] - (0.5 - 63.5 / 128.0)).abs() < EPS);
    }

    #[test]
    fn test_draw_order_toggle() {
        let mut scene = BlendScene::new(800, 600);
        assert_eq!(scene.draw_order()[0], RenderLayer::Opaque);
        assert_eq!(scene.draw_order()[3], RenderLayer::AnimatedBolt);

        assert!(scene.handle_key(KeyCode::Digit1));
        assert!(scene.transparent_first());
        assert_eq!(
            scene.draw_order(),
            [
                RenderLayer::Transparent,
                RenderLayer::AnimatedBolt,
                RenderLayer::Opaque,
                RenderLayer::AlphaTested,
            ]
        );

        scene.handle_key(KeyCode::Digit1);
        assert!(!scene.transparent_first());
    }

    #[test]
    fn test_draw_mode_keys() {
        let mut scene = BlendScene::new(800, 600);
        assert_eq!(scene.draw_mode(), DrawMode::Normal);
        scene.handle_key(KeyCode::F2);
        assert_eq!(scene.draw_mode(), DrawMode::PixelOverdraw);
        scene.handle_key(KeyCode::F1);
        assert_eq!(scene.draw_mode(), DrawMode::Normal);
        assert!(!scene.handle_key(KeyCode::Digit2));
    }

    #[test]
    fn test_grid_indices_u16() {
        let indices = grid_indices_u16(256, 256);
        assert_eq!(indices.len(), 255 * 255 * 6);
        assert_eq!(indices.iter().copied().max(), Some(u16::MAX));
        assert_eq!(&indices[indices.len() - 6..], &[65278, 65279, 65534, 65534, 65279, 65535]);

        assert!(grid_indices_u16(1, 5).is_empty());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "does not fit 16-bit indices")]
    fn test_grid_indices_u16_rejects_large_grid() {
        grid_indices_u16(257, 256);
    }

    #[test]
    fn test_water_scroll_wraps() {
        let mut scene = BlendScene::new(800, 600);
        scene.update(0.0, 6.0);
        scene.update(0.0, 6.0);
        let water = scene.material("water").unwrap();
        assert!((water.mat_transform[(0, 3)] - 0.2).abs() < 1e-4);
        assert!((water.mat_transform[(1, 3)] - 0.24).abs() < 1e-4);
        assert!(water.num_frames_dirty > 0);
    }

    #[test]
    fn test_bolt_advances_at_thirty_fps() {
        let mut scene = BlendScene::new(800, 600);
        scene.update(1.0, 0.0);
        assert_eq!(scene.material("boltAnim").unwrap().diffuse_srv_heap_index, 3);

        scene.update(1.01, 0.01);
        assert_eq!(scene.material("boltAnim").unwrap().diffuse_srv_heap_index, 3);

        scene.update(1.05, 0.04);
        assert_eq!(scene.material("boltAnim").unwrap().diffuse_srv_heap_index, 4);
    }

    #[test]
    fn test_waves_get_disturbed() {
        let mut scene = BlendScene::new(800, 600);
        scene.update(0.3, 0.0);
        let disturbed = (0..scene.waves().vertex_count())
            .any(|i| scene.waves().position(i).y != 0.0);
        assert!(disturbed);
    }

    #[test]
    fn test_pass_constants() {
        let scene = BlendScene::new(800, 600);
        let pass = scene.pass_constants((800, 600), &GameTimer::new());
        assert_eq!(pass.fog_color, [0.7, 0.7, 0.7, 1.0]);
        assert_eq!(pass.fog_start, 5.0);
        assert_eq!(pass.fog_range, 150.0);
        assert_eq!(pass.lights[0].strength, [0.9, 0.9, 0.8]);
        assert_eq!(scene.clear_color(), FOG_COLOR);
    }
}
