//! 三个示例的场景数据
//!
//! 这里只描述场景本身：几何体、材质、渲染项、相机和按键。
//! 与图形 API 相关的部分在 `gfx::dx12` 中。

pub mod blend_scene;
pub mod box_scene;
pub mod crate_scene;

pub use blend_scene::{BlendScene, DrawMode};
pub use box_scene::BoxScene;
pub use crate_scene::{CrateScene, FillMode};
