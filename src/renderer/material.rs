//! 材质
//!
//! CPU 侧的材质参数。修改后调用 [`Material::mark_dirty`]，
//! 之后每个帧资源各上传一次。

use super::constants::MaterialConstants;
use super::resource::NUM_FRAME_RESOURCES;
use crate::math::{to_shader_matrix, Matrix4, Vector3, Vector4};

/// 材质
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// 材质名称（用于日志）
    pub name: String,

    /// 在材质常量缓冲区中的索引
    pub mat_cb_index: usize,

    /// 漫反射纹理在 SRV 堆中的索引
    pub diffuse_srv_heap_index: usize,

    /// 还需要上传的帧资源数量
    pub num_frames_dirty: usize,

    pub diffuse_albedo: Vector4,
    pub fresnel_r0: Vector3,
    pub roughness: f32,

    /// 纹理坐标变换（用于水面流动）
    pub mat_transform: Matrix4,
}

impl Material {
    pub fn new(name: impl Into<String>, mat_cb_index: usize, diffuse_srv_heap_index: usize) -> Self {
        Self {
            name: name.into(),
            mat_cb_index,
            diffuse_srv_heap_index,
            num_frames_dirty: NUM_FRAME_RESOURCES,
            diffuse_albedo: Vector4::new(1.0, 1.0, 1.0, 1.0),
            fresnel_r0: Vector3::new(0.01, 0.01, 0.01),
            roughness: 0.25,
            mat_transform: Matrix4::identity(),
        }
    }

    pub fn with_albedo(mut self, albedo: Vector4) -> Self {
        self.diffuse_albedo = albedo;
        self
    }

    pub fn with_fresnel(mut self, fresnel_r0: f32) -> Self {
        self.fresnel_r0 = Vector3::repeat(fresnel_r0);
        self
    }

    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness;
        self
    }

    /// 需要重新上传到所有帧资源
    pub fn mark_dirty(&mut self) {
        self.num_frames_dirty = NUM_FRAME_RESOURCES;
    }

    /// 当前帧是否需要上传；返回 `true` 时计数减一
    pub fn take_dirty(&mut self) -> bool {
        if self.num_frames_dirty > 0 {
            self.num_frames_dirty -= 1;
            true
        } else {
            false
        }
    }

    /// 常量缓冲区数据
    pub fn constants(&self) -> MaterialConstants {
        MaterialConstants {
            diffuse_albedo: self.diffuse_albedo.into(),
            fresnel_r0: self.fresnel_r0.into(),
            roughness: self.roughness,
            mat_transform: to_shader_matrix(&self.mat_transform),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_material_uploads_to_every_frame() {
        let mut mat = Material::new("woodCrate", 0, 0);
        for _ in 0..NUM_FRAME_RESOURCES {
            assert!(mat.take_dirty());
        }
        assert!(!mat.take_dirty());

        mat.mark_dirty();
        assert_eq!(mat.num_frames_dirty, NUM_FRAME_RESOURCES);
    }

    #[test]
    fn test_constants() {
        let mat = Material::new("water", 1, 1)
            .with_albedo(Vector4::new(1.0, 1.0, 1.0, 0.5))
            .with_fresnel(0.1)
            .with_roughness(0.0);

        let cb = mat.constants();
        assert_eq!(cb.diffuse_albedo, [1.0, 1.0, 1.0, 0.5]);
        assert_eq!(cb.fresnel_r0, [0.1, 0.1, 0.1]);
        assert_eq!(cb.roughness, 0.0);
        assert_eq!(cb.mat_transform[0], [1.0, 0.0, 0.0, 0.0]);
    }
}
