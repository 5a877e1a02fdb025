//! 渲染器模块
//!
//! 与图形 API 无关的渲染数据模型：常量缓冲区布局、材质、渲染项、
//! 采样器状态、纹理数据、着色器源码，以及帧资源环和 Fence 记录。
//! Direct3D 12 的具体实现在 `gfx::dx12` 中，它只消费这里定义的类型。
//!
//! # 模块组织
//!
//! - `backend_trait`：各示例渲染器实现的统一接口
//! - `constants`：常量缓冲区结构体
//! - `material` / `render_item`：场景数据与脏标记
//! - `resource` / `sync`：三缓冲帧资源与 Fence 值
//! - `sampler`：采样器设置
//! - `shaders`：HLSL 源码与宏变体
//! - `texture`：RGBA8 纹理解码

pub mod backend_trait;
pub mod constants;
pub mod material;
pub mod render_item;
pub mod resource;
pub mod sampler;
pub mod shaders;
pub mod sync;
pub mod texture;

pub use backend_trait::RenderBackend;
pub use constants::{
    BoxGlobalConstants, BoxObjectConstants, MaterialConstants, ObjectConstants, PassConstants,
};
pub use material::Material;
pub use render_item::{RenderItem, RenderLayer, RenderLayers};
pub use resource::{constant_buffer_byte_size, FrameResourceRing, NUM_FRAME_RESOURCES};
pub use sampler::{AddressMode, FilterMode, SamplerSettings};
pub use shaders::{ShaderDefines, ShaderProgram, ShaderSource, ShaderStage};
pub use sync::{FenceManager, FenceValue};
pub use texture::TextureData;
