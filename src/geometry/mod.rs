//! 几何体模块
//!
//! 顶点格式、网格数据、程序化几何体生成与水面波浪模拟。
//!
//! # 模块结构
//!
//! - `vertex`: 顶点数据结构定义
//! - `mesh`: 网格数据和子网格结构
//! - `generator`: 方块、网格、圆柱、屏幕四边形
//! - `waves`: 有限差分波浪
//!
//! # 数据流
//!
//! ```text
//! GeometryGenerator / Waves
//!     ↓
//! MeshData (CPU侧数据)
//!     ↓
//! 转换为 TexVertex（方块示例直接上传位置流和颜色流）
//!     ↓
//! MeshGeometry (上传到GPU)
//! ```

pub mod generator;
pub mod mesh;
pub mod vertex;
pub mod waves;

// 重新导出常用类型
pub use generator::GeometryGenerator;
pub use mesh::{MeshData, SubmeshGeometry};
pub use vertex::{TexVertex, Vertex};
pub use waves::Waves;
