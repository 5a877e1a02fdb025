//! 图形后端模块
//!
//! 只有 Direct3D 12 一个后端，仅在 Windows 上编译。
//! 与平台无关的数据模型在 `renderer` 和 `demos` 中。

#[cfg(target_os = "windows")]
pub mod dx12;

#[cfg(target_os = "windows")]
pub use dx12::{create_backend, Dx12Context};
