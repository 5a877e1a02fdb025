//! 箱子示例的场景数据
//!
//! 两个细分过的方块：左边是木箱纹理，右边是旋转的光晕纹理。
//! 键盘控制纹理缩放、过滤方式、寻址方式和填充模式。

use winit::keyboard::KeyCode;

use crate::app_info;
use crate::component::{three_point_lights, OrbitCamera, Projection};
use crate::core::{GameTimer, InputSystem};
use crate::geometry::{GeometryGenerator, MeshData, SubmeshGeometry, TexVertex};
use crate::math::{rotation_z, scaling, translation, Color, Matrix4};
use crate::renderer::{
    AddressMode, FilterMode, Material, PassConstants, RenderItem, SamplerSettings,
};

/// SRV 堆中的纹理文件，顺序即堆中的索引
pub const CRATE_TEXTURES: [&str; 3] = ["mipmaps.dds", "flare.dds", "flarealpha.dds"];

/// 木箱渲染项在列表中的索引
pub const WOOD_CRATE_ITEM: usize = 0;

/// 光晕渲染项在列表中的索引
pub const FLARE_ITEM: usize = 1;

/// 纹理缩放的步长与下限
const TEX_SCALE_DELTA: f32 = 0.01;
const MIN_TEX_SCALE: f32 = 0.1;

/// 填充模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// 箱子场景
#[derive(Debug, Clone)]
pub struct CrateScene {
    camera: OrbitCamera,
    projection: Projection,
    materials: Vec<Material>,
    items: Vec<RenderItem>,
    sampler: SamplerSettings,
    tex_scale: f32,
    fill_mode: FillMode,
    box_mesh: MeshData,
}

impl CrateScene {
    pub fn new(width: u32, height: u32) -> Self {
        let box_mesh = GeometryGenerator::create_box(1.0, 1.0, 1.0, 3);
        let submesh = SubmeshGeometry::whole(&box_mesh);

        let materials = vec![
            Material::new("woodCrate", 0, 0)
                .with_fresnel(0.05)
                .with_roughness(0.2),
            Material::new("flareBox", 1, 1)
                .with_fresnel(0.05)
                .with_roughness(0.2),
        ];

        let items = vec![
            RenderItem::new(0, "woodCrate", "boxGeo", submesh)
                .with_world(translation(-0.75, 0.0, 0.0)),
            RenderItem::new(1, "flareBox", "boxGeo", submesh)
                .with_world(translation(0.75, 0.0, 0.0)),
        ];

        Self {
            camera: OrbitCamera::crate_preset(),
            projection: Projection::from_size(width, height),
            materials,
            items,
            sampler: SamplerSettings::new(),
            tex_scale: 1.0,
            fill_mode: FillMode::Solid,
            box_mesh,
        }
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn clear_color(&self) -> Color {
        Color::LIGHT_STEEL_BLUE
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.projection.set_size(width, height);
    }

    pub fn fill_mode(&self) -> FillMode {
        self.fill_mode
    }

    pub fn tex_scale(&self) -> f32 {
        self.tex_scale
    }

    pub fn sampler(&self) -> &SamplerSettings {
        &self.sampler
    }

    pub fn sampler_mut(&mut self) -> &mut SamplerSettings {
        &mut self.sampler
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

    /// 上传用的顶点
    pub fn box_vertices(&self) -> Vec<TexVertex> {
        self.box_mesh.vertices.iter().map(TexVertex::from).collect()
    }

    pub fn box_indices(&self) -> Vec<u16> {
        self.box_mesh.indices16()
    }

    /// 处理鼠标与键盘输入
    pub fn handle_input(&mut self, input: &mut InputSystem) {
        input.update_camera(&mut self.camera);
        for key in input.take_pressed_keys() {
            self.handle_key(key);
        }
    }

    /// 处理一次按键，返回按键是否被使用
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Digit1 => self.scale_tex_transform(TEX_SCALE_DELTA),
            KeyCode::Digit2 => self.scale_tex_transform(-TEX_SCALE_DELTA),
            KeyCode::Digit3 => self.sampler.set_filter(FilterMode::Point),
            KeyCode::Digit4 => self.sampler.set_filter(FilterMode::Linear),
            KeyCode::Digit5 => self.sampler.set_filter(FilterMode::Anisotropic),
            KeyCode::Digit6 => self.sampler.set_address(AddressMode::Wrap),
            KeyCode::Digit7 => self.sampler.set_address(AddressMode::Clamp),
            KeyCode::Digit8 => self.sampler.set_address(AddressMode::Border),
            KeyCode::Digit9 => self.sampler.set_address(AddressMode::Mirror),
            KeyCode::F1 => self.fill_mode = FillMode::Solid,
            KeyCode::F2 => self.fill_mode = FillMode::Wireframe,
            _ => return false,
        }

        app_info!(
            key = ?key,
            tex_scale = self.tex_scale,
            filter = ?self.sampler.filter(),
            address = ?self.sampler.address(),
            fill_mode = ?self.fill_mode,
            "Crate settings changed"
        );
        true
    }

    /// 所有渲染项的纹理缩放，不小于 0.1
    fn scale_tex_transform(&mut self, delta: f32) {
        self.tex_scale = (self.tex_scale + delta).max(MIN_TEX_SCALE);
        let scale = scaling(self.tex_scale, self.tex_scale, 1.0);
        for item in &mut self.items {
            item.tex_transform = scale;
            item.mark_dirty();
        }
    }

    /// 光晕纹理绕 (0.5, 0.5) 旋转
    pub fn animate(&mut self, total_time: f32) {
        let flare = &mut self.items[FLARE_ITEM];
        flare.tex_transform = flare_tex_transform(total_time);
        flare.mark_dirty();
    }

    pub fn pass_constants(&self, size: (u32, u32), timer: &GameTimer) -> PassConstants {
        PassConstants::build(&self.camera, &self.projection, size, timer)
            .with_ambient(Color::new(0.25, 0.25, 0.35, 1.0))
            .with_lights(&three_point_lights([0.6, 0.6, 0.6]))
    }
}

/// 先平移到 UV 中心，旋转，再平移回去
pub fn flare_tex_transform(angle: f32) -> Matrix4 {
    translation(0.5, 0.5, 0.0) * rotation_z(angle) * translation(-0.5, -0.5, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::constants::PI;
    use crate::math::Vector4;

    const EPS: f32 = 1e-5;

    #[test]
    fn test_initial_state() {
        let scene = CrateScene::new(800, 600);
        assert_eq!(scene.items().len(), 2);
        assert_eq!(scene.fill_mode(), FillMode::Solid);
        assert_eq!(scene.sampler().filter(), FilterMode::Point);
        assert_eq!(scene.sampler().address(), AddressMode::Wrap);
        assert_eq!(scene.materials()[1].diffuse_srv_heap_index, 1);
        assert_eq!(scene.materials()[0].diffuse_albedo, Vector4::new(1.0, 1.0, 1.0, 1.0));
        assert_eq!(scene.items()[WOOD_CRATE_ITEM].world[(0, 3)], -0.75);
        assert_eq!(scene.items()[FLARE_ITEM].world[(0, 3)], 0.75);
    }

    #[test]
    fn test_box_geometry() {
        let scene = CrateScene::new(800, 600);
        let vertices = scene.box_vertices();
        let indices = scene.box_indices();
        assert_eq!(indices.len(), 36 * 4 * 4 * 4);
        assert!(indices.iter().all(|&i| (i as usize) < vertices.len()));
        assert_eq!(scene.items()[0].index_count as usize, indices.len());
    }

    #[test]
    fn test_tex_scale_keys() {
        let mut scene = CrateScene::new(800, 600);
        for item in scene.items_mut() {
            while item.take_dirty() {}
        }

        assert!(scene.handle_key(KeyCode::Digit1));
        assert!((scene.tex_scale() - 1.01).abs() < EPS);
        assert!(scene.items().iter().all(|i| i.num_frames_dirty > 0));
        assert!((scene.items()[0].tex_transform[(0, 0)] - 1.01).abs() < EPS);
        assert_eq!(scene.items()[0].tex_transform[(2, 2)], 1.0);

        for _ in 0..200 {
            scene.handle_key(KeyCode::Digit2);
        }
        assert!((scene.tex_scale() - MIN_TEX_SCALE).abs() < EPS);
    }

    #[test]
    fn test_sampler_keys() {
        let mut scene = CrateScene::new(800, 600);
        scene.sampler_mut().take_dirty();

        scene.handle_key(KeyCode::Digit3);
        assert!(!scene.sampler().is_dirty());

        scene.handle_key(KeyCode::Digit5);
        scene.handle_key(KeyCode::Digit8);
        assert_eq!(scene.sampler().filter(), FilterMode::Anisotropic);
        assert_eq!(scene.sampler().address(), AddressMode::Border);
        assert!(scene.sampler_mut().take_dirty());
    }

    #[test]
    fn test_fill_mode_keys() {
        let mut scene = CrateScene::new(800, 600);
        scene.handle_key(KeyCode::F2);
        assert_eq!(scene.fill_mode(), FillMode::Wireframe);
        scene.handle_key(KeyCode::F1);
        assert_eq!(scene.fill_mode(), FillMode::Solid);
        assert!(!scene.handle_key(KeyCode::KeyQ));
    }

    #[test]
    fn test_flare_rotates_about_center() {
        let m = flare_tex_transform(0.5 * PI);
        let center = m * Vector4::new(0.5, 0.5, 0.0, 1.0);
        assert!((center.x - 0.5).abs() < EPS && (center.y - 0.5).abs() < EPS);

        // (1, 0.5) 逆时针转 90° 到 (0.5, 1)
        let p = m * Vector4::new(1.0, 0.5, 0.0, 1.0);
        assert!((p.x - 0.5).abs() < EPS && (p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn test_animate_marks_flare_dirty() {
        let mut scene = CrateScene::new(800, 600);
        for item in scene.items_mut() {
            while item.take_dirty() {}
        }
        scene.animate(1.0);
        assert!(scene.items()[FLARE_ITEM].num_frames_dirty > 0);
        assert_eq!(scene.items()[WOOD_CRATE_ITEM].num_frames_dirty, 0);
    }

    #[test]
    fn test_pass_constants() {
        let scene = CrateScene::new(800, 600);
        let pass = scene.pass_constants((800, 600), &GameTimer::new());
        assert_eq!(pass.ambient_light, [0.25, 0.25, 0.35, 1.0]);
        assert_eq!(pass.lights[0].strength, [0.6, 0.6, 0.6]);
    }
}
