//! 组件模块
//!
//! 轨道相机与光源。

mod camera;
mod light;

pub use camera::{OrbitCamera, Projection, DEGREES_PER_PIXEL};
pub use light::{three_point_lights, Light, MAX_LIGHTS};
