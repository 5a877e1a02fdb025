//! 常量缓冲区数据
//!
//! 这些结构体逐字节上传到 GPU，字段顺序与 HLSL 中的 cbuffer 一致，
//! 并按 16 字节寄存器规则手动补齐（`float3` 后面紧跟一个 `float`）。
//! 矩阵一律经过 [`to_shader_matrix`] 转换。

use bytemuck::{Pod, Zeroable};

use crate::component::{Light, OrbitCamera, Projection, MAX_LIGHTS};
use crate::core::GameTimer;
use crate::math::{self, inverse_or_identity, to_shader_matrix, Color, Matrix4};

const IDENTITY: [[f32; 4]; 4] = [
    [1.0, 0.0, 0.0, 0.0],
    [0.0, 1.0, 0.0, 0.0],
    [0.0, 0.0, 1.0, 0.0],
    [0.0, 0.0, 0.0, 1.0],
];

/// 物体常量（`cbPerObject`，b0）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub world: [[f32; 4]; 4],
    pub tex_transform: [[f32; 4]; 4],
}

impl ObjectConstants {
    pub fn new(world: &Matrix4, tex_transform: &Matrix4) -> Self {
        Self {
            world: to_shader_matrix(world),
            tex_transform: to_shader_matrix(tex_transform),
        }
    }
}

impl Default for ObjectConstants {
    fn default() -> Self {
        Self {
            world: IDENTITY,
            tex_transform: IDENTITY,
        }
    }
}

/// 渲染过程常量（`cbPass`，b1）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PassConstants {
    pub view: [[f32; 4]; 4],
    pub inv_view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
    pub inv_proj: [[f32; 4]; 4],
    pub view_proj: [[f32; 4]; 4],
    pub inv_view_proj: [[f32; 4]; 4],
    pub eye_pos_w: [f32; 3],
    pub _pad0: f32,
    pub render_target_size: [f32; 2],
    pub inv_render_target_size: [f32; 2],
    pub near_z: f32,
    pub far_z: f32,
    pub total_time: f32,
    pub delta_time: f32,
    pub ambient_light: [f32; 4],
    pub fog_color: [f32; 4],
    pub fog_start: f32,
    pub fog_range: f32,
    pub _pad1: [f32; 2],
    pub lights: [Light; MAX_LIGHTS],
}

impl PassConstants {
    /// 根据相机、投影、渲染目标尺寸和计时器填充
    ///
    /// 环境光、雾和光源保持默认值，由 `with_*` 方法设置。
    pub fn build(
        camera: &OrbitCamera,
        projection: &Projection,
        size: (u32, u32),
        timer: &GameTimer,
    ) -> Self {
        let view = camera.view_matrix();
        let proj = projection.matrix();
        let view_proj = proj * view;

        let width = size.0.max(1) as f32;
        let height = size.1.max(1) as f32;

        Self {
            view: to_shader_matrix(&view),
            inv_view: to_shader_matrix(&inverse_or_identity(&view)),
            proj: to_shader_matrix(&proj),
            inv_proj: to_shader_matrix(&inverse_or_identity(&proj)),
            view_proj: to_shader_matrix(&view_proj),
            inv_view_proj: to_shader_matrix(&inverse_or_identity(&view_proj)),
            eye_pos_w: camera.eye_position().into(),
            render_target_size: [width, height],
            inv_render_target_size: [1.0 / width, 1.0 / height],
            near_z: projection.near_z,
            far_z: projection.far_z,
            total_time: timer.total_time(),
            delta_time: timer.delta_time(),
            ..Self::default()
        }
    }

    pub fn with_ambient(mut self, ambient: Color) -> Self {
        self.ambient_light = ambient.to_array();
        self
    }

    pub fn with_fog(mut self, color: Color, start: f32, range: f32) -> Self {
        self.fog_color = color.to_array();
        self.fog_start = start;
        self.fog_range = range;
        self
    }

    /// 写入前几个光源槽位，其余保持默认
    pub fn with_lights(mut self, lights: &[Light]) -> Self {
        for (slot, light) in self.lights.iter_mut().zip(lights) {
            *slot = *light;
        }
        self
    }
}

impl Default for PassConstants {
    fn default() -> Self {
        Self {
            view: IDENTITY,
            inv_view: IDENTITY,
            proj: IDENTITY,
            inv_proj: IDENTITY,
            view_proj: IDENTITY,
            inv_view_proj: IDENTITY,
            eye_pos_w: [0.0; 3],
            _pad0: 0.0,
            render_target_size: [0.0; 2],
            inv_render_target_size: [0.0; 2],
            near_z: 0.0,
            far_z: 0.0,
            total_time: 0.0,
            delta_time: 0.0,
            ambient_light: [0.0, 0.0, 0.0, 1.0],
            fog_color: [0.7, 0.7, 0.7, 1.0],
            fog_start: 5.0,
            fog_range: 150.0,
            _pad1: [0.0; 2],
            lights: [Light::default(); MAX_LIGHTS],
        }
    }
}

/// 材质常量（`cbMaterial`，b2）
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MaterialConstants {
    pub diffuse_albedo: [f32; 4],
    pub fresnel_r0: [f32; 3],
    pub roughness: f32,
    pub mat_transform: [[f32; 4]; 4],
}

impl Default for MaterialConstants {
    fn default() -> Self {
        Self {
            diffuse_albedo: [1.0; 4],
            fresnel_r0: [0.01; 3],
            roughness: 0.25,
            mat_transform: IDENTITY,
        }
    }
}

/// 方块示例的物体常量
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BoxObjectConstants {
    pub world_view_proj: [[f32; 4]; 4],
    pub current_time: f32,
    pub _pad: [f32; 3],
}

impl BoxObjectConstants {
    pub fn new(world_view_proj: &Matrix4, current_time: f32) -> Self {
        Self {
            world_view_proj: math::to_shader_matrix(world_view_proj),
            current_time,
            _pad: [0.0; 3],
        }
    }
}

/// 方块示例的全局常量
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct BoxGlobalConstants {
    pub global_time: f32,
    pub _pad: [f32; 3],
}

impl BoxGlobalConstants {
    pub fn new(global_time: f32) -> Self {
        Self {
            global_time,
            _pad: [0.0; 3],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::three_point_lights;
    use std::mem::{offset_of, size_of};

    #[test]
    fn test_sizes_are_register_aligned() {
        assert_eq!(size_of::<ObjectConstants>(), 128);
        assert_eq!(size_of::<MaterialConstants>(), 96);
        assert_eq!(size_of::<BoxObjectConstants>(), 80);
        assert_eq!(size_of::<BoxGlobalConstants>(), 16);
        assert_eq!(size_of::<PassConstants>() % 16, 0);
    }

    #[test]
    fn test_pass_layout_matches_hlsl() {
        assert_eq!(offset_of!(PassConstants, eye_pos_w), 384);
        assert_eq!(offset_of!(PassConstants, render_target_size), 400);
        assert_eq!(offset_of!(PassConstants, near_z), 416);
        assert_eq!(offset_of!(PassConstants, ambient_light), 432);
        assert_eq!(offset_of!(PassConstants, fog_color), 448);
        assert_eq!(offset_of!(PassConstants, fog_start), 464);
        assert_eq!(offset_of!(PassConstants, lights), 480);
        assert_eq!(size_of::<PassConstants>(), 480 + 48 * MAX_LIGHTS);
    }

    #[test]
    fn test_pass_build() {
        let camera = OrbitCamera::crate_preset();
        let projection = Projection::from_size(800, 600);
        let timer = GameTimer::new();

        let pass = PassConstants::build(&camera, &projection, (800, 600), &timer)
            .with_ambient(Color::new(0.25, 0.25, 0.35, 1.0))
            .with_lights(&three_point_lights([0.6, 0.6, 0.6]));

        assert_eq!(pass.render_target_size, [800.0, 600.0]);
        assert_eq!(pass.inv_render_target_size, [1.0 / 800.0, 1.0 / 600.0]);
        assert_eq!(pass.near_z, 1.0);
        assert_eq!(pass.far_z, 1000.0);
        assert_eq!(pass.ambient_light, [0.25, 0.25, 0.35, 1.0]);
        assert_eq!(pass.lights[0].strength, [0.6, 0.6, 0.6]);
        assert_eq!(pass.lights[3], Light::default());

        let eye: [f32; 3] = camera.eye_position().into();
        assert_eq!(pass.eye_pos_w, eye);
    }

    #[test]
    fn test_inverse_view_round_trips() {
        let camera = OrbitCamera::blend_preset();
        let pass = PassConstants::build(&camera, &Projection::new(1.0), (1, 1), &GameTimer::new());

        let view = Matrix4::from(pass.view);
        let inv_view = Matrix4::from(pass.inv_view);
        let product = view * inv_view;
        assert!((product - Matrix4::identity()).abs().max() < 1e-3);
    }

    #[test]
    fn test_fog_defaults() {
        let pass = PassConstants::default().with_fog(Color::new(0.7, 0.7, 0.7, 1.0), 5.0, 150.0);
        assert_eq!(pass.fog_color, [0.7, 0.7, 0.7, 1.0]);
        assert_eq!(pass.fog_start, 5.0);
        assert_eq!(pass.fog_range, 150.0);
    }
}
