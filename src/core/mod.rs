//! 核心功能模块
//!
//! 本模块提供示例程序共用的基础设施，与具体的图形 API 无关。
//!
//! # 模块组织
//!
//! - `config`：配置管理，支持从配置文件和命令行加载设置
//! - `error`：错误处理，定义统一的错误类型
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `timer`：游戏计时器与帧率统计
//! - `input`：键盘与鼠标输入

pub mod config;
pub mod error;
pub mod input;
pub mod log;
pub mod timer;

// 重新导出常用类型，方便使用
pub use config::{Config, DemoKind};
pub use error::{DemoError, Result};
pub use input::{InputSystem, MouseDrag};
pub use timer::{FrameStats, GameTimer};
