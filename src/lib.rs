//! dx12_demos - Direct3D 12 示例集
//!
//! 三个示例共用一套基础设施：
//!
//! - 方块：两个顶点流 + 描述符表里的两个常量缓冲
//! - 箱子：纹理、可切换的采样器、旋转的光晕
//! - 混合：地形、动态水面、铁丝网、闪电动画和像素重绘可视化
//!
//! # 模块结构
//!
//! - `core`: 配置、错误处理、日志、计时器、输入
//! - `math` / `component`: 矩阵工具、轨道相机、灯光
//! - `geometry`: 顶点格式、程序化网格、波浪模拟
//! - `renderer`: 与图形 API 无关的渲染数据（常量缓冲、材质、渲染项、帧资源环）
//! - `demos`: 三个示例的场景状态与交互
//! - `gfx`: Direct3D 12 实现（仅 Windows）
//!
//! # 使用示例
//!
//! ```no_run
//! use dx12_demos::demos::BlendScene;
//! use winit::keyboard::KeyCode;
//!
//! let mut scene = BlendScene::new(800, 600);
//! scene.handle_key(KeyCode::F2);
//! scene.update(0.016, 0.016);
//! let water = scene.water_vertices();
//! assert_eq!(water.len(), scene.waves().vertex_count());
//! ```

pub mod component;
pub mod core;
pub mod demos;
pub mod geometry;
pub mod gfx;
pub mod math;
pub mod renderer;
