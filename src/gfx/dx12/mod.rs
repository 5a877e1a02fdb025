//! DirectX 12 实现
//!
//! - `context`：设备、命令队列、交换链、深度模板缓冲等基础设施
//! - `descriptor`：描述符堆
//! - `buffer`：上传缓冲、默认缓冲和网格几何体
//! - `frame`：帧资源
//! - `pipeline`：着色器编译、根签名、PSO 和采样器
//! - `texture`：纹理上传
//! - `box_renderer` / `crate_renderer` / `blend_renderer`：三个示例的渲染器

pub mod blend_renderer;
pub mod box_renderer;
pub mod buffer;
pub mod context;
pub mod crate_renderer;
pub mod descriptor;
pub mod frame;
pub mod pipeline;
pub mod texture;

pub use blend_renderer::BlendRenderer;
pub use box_renderer::BoxRenderer;
pub use context::Dx12Context;
pub use crate_renderer::CrateRenderer;

use winit::event_loop::EventLoop;

use crate::core::error::{DemoError, GraphicsError, Result};
use crate::core::{Config, DemoKind};
use crate::engine_error;
use crate::renderer::RenderBackend;

/// 按配置创建示例渲染器，窗口也在这里创建
pub fn create_backend(event_loop: &EventLoop<()>, config: &Config) -> Result<Box<dyn RenderBackend>> {
    let backend: Box<dyn RenderBackend> = match config.demo.kind {
        DemoKind::Box => Box::new(BoxRenderer::new(event_loop, config)?),
        DemoKind::Crate => Box::new(CrateRenderer::new(event_loop, config)?),
        DemoKind::Blend => Box::new(BlendRenderer::new(event_loop, config)?),
    };
    Ok(backend)
}

/// 把 `windows::core::Error` 包装为资源创建错误
pub(crate) fn creation_error(what: &'static str) -> impl Fn(windows::core::Error) -> DemoError {
    move |e| GraphicsError::ResourceCreation(format!("{}: {:?}", what, e)).into()
}

/// 渲染器析构时刷新队列，失败只记录日志
///
/// 返回刷新是否成功。
pub(crate) fn flush_on_drop(result: Result<()>, renderer: &str) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            engine_error!(renderer, error = %e, "Failed to flush command queue before releasing frame resources");
            false
        }
    }
}

/// 把 `windows::core::Error` 包装为命令执行错误
pub(crate) fn command_error(what: &'static str) -> impl Fn(windows::core::Error) -> DemoError {
    move |e| GraphicsError::CommandExecution(format!("{}: {:?}", what, e)).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_on_drop() {
        assert!(flush_on_drop(Ok(()), "box"));
        assert!(!flush_on_drop(
            Err(DemoError::Runtime("device removed".to_string())),
            "blend"
        ));
    }
}
