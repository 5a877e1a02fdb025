//! 渲染项
//!
//! 一次绘制调用所需的全部参数：世界矩阵、材质、几何体以及索引范围。

use super::constants::ObjectConstants;
use super::resource::NUM_FRAME_RESOURCES;
use crate::geometry::SubmeshGeometry;
use crate::math::Matrix4;

/// 渲染层，决定使用哪个 PSO 以及绘制顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderLayer {
    Opaque,
    Transparent,
    AlphaTested,
    AnimatedBolt,
}

impl RenderLayer {
    pub const ALL: [RenderLayer; 4] = [
        RenderLayer::Opaque,
        RenderLayer::Transparent,
        RenderLayer::AlphaTested,
        RenderLayer::AnimatedBolt,
    ];

    fn slot(self) -> usize {
        match self {
            RenderLayer::Opaque => 0,
            RenderLayer::Transparent => 1,
            RenderLayer::AlphaTested => 2,
            RenderLayer::AnimatedBolt => 3,
        }
    }
}

/// 渲染项
#[derive(Debug, Clone, PartialEq)]
pub struct RenderItem {
    /// 世界矩阵
    pub world: Matrix4,

    /// 纹理坐标变换
    pub tex_transform: Matrix4,

    /// 还需要上传的帧资源数量
    pub num_frames_dirty: usize,

    /// 在物体常量缓冲区中的索引
    pub obj_cb_index: usize,

    /// 材质名称
    pub material: String,

    /// 几何体名称
    pub geometry: String,

    pub index_count: u32,
    pub start_index_location: u32,
    pub base_vertex_location: i32,
}

impl RenderItem {
    pub fn new(
        obj_cb_index: usize,
        material: impl Into<String>,
        geometry: impl Into<String>,
        submesh: SubmeshGeometry,
    ) -> Self {
        Self {
            world: Matrix4::identity(),
            tex_transform: Matrix4::identity(),
            num_frames_dirty: NUM_FRAME_RESOURCES,
            obj_cb_index,
            material: material.into(),
            geometry: geometry.into(),
            index_count: submesh.index_count,
            start_index_location: submesh.start_index_location,
            base_vertex_location: submesh.base_vertex_location,
        }
    }

    pub fn with_world(mut self, world: Matrix4) -> Self {
        self.world = world;
        self
    }

    pub fn with_tex_transform(mut self, tex_transform: Matrix4) -> Self {
        self.tex_transform = tex_transform;
        self
    }

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

    pub fn constants(&self) -> ObjectConstants {
        ObjectConstants::new(&self.world, &self.tex_transform)
    }
}

/// 按渲染层分组的渲染项索引
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderLayers {
    layers: [Vec<usize>; 4],
}

impl RenderLayers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, layer: RenderLayer, item_index: usize) {
        self.layers[layer.slot()].push(item_index);
    }

    pub fn items(&self, layer: RenderLayer) -> &[usize] {
        &self.layers[layer.slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::translation;

    #[test]
    fn test_dirty_countdown() {
        let mut item = RenderItem::new(0, "grass", "landGeo", SubmeshGeometry::new(6, 0, 0));
        assert_eq!(item.num_frames_dirty, NUM_FRAME_RESOURCES);

        let uploads = std::iter::from_fn(|| item.take_dirty().then_some(())).count();
        assert_eq!(uploads, NUM_FRAME_RESOURCES);

        item.mark_dirty();
        assert!(item.take_dirty());
    }

    #[test]
    fn test_constants_carry_world() {
        let item = RenderItem::new(2, "wirefence", "boxGeo", SubmeshGeometry::new(36, 0, 0))
            .with_world(translation(3.0, 2.0, -9.0));
        let cb = item.constants();
        assert_eq!(cb.world[0][3], 3.0);
        assert_eq!(cb.world[1][3], 2.0);
        assert_eq!(cb.world[2][3], -9.0);
    }

    #[test]
    fn test_layers() {
        let mut layers = RenderLayers::new();
        layers.push(RenderLayer::Transparent, 0);
        layers.push(RenderLayer::Opaque, 1);
        layers.push(RenderLayer::Opaque, 4);

        assert_eq!(layers.items(RenderLayer::Opaque), &[1, 4]);
        assert_eq!(layers.items(RenderLayer::Transparent), &[0]);
        assert!(layers.items(RenderLayer::AnimatedBolt).is_empty());
    }
}
