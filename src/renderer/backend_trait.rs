//! 统一的示例渲染器接口
//!
//! 每个示例（方块、箱子、混合）各自实现 [`RenderBackend`]，
//! 主循环只通过这个 trait 驱动它们，不关心具体是哪个示例。

use crate::core::error::Result;
use crate::core::input::InputSystem;
use crate::core::timer::GameTimer;
use winit::window::Window;

/// 示例渲染器接口
///
/// # 方法说明
///
/// - `window()`: 获取窗口引用，用于更新标题、请求重绘
/// - `resize()`: 窗口尺寸变化后重建交换链缓冲区和深度缓冲区
/// - `update()`: 处理输入、推进动画、写入当前帧资源的常量缓冲区
/// - `draw()`: 记录命令、提交、呈现
///
/// # 示例
///
/// ```ignore
/// let mut backend: Box<dyn RenderBackend> = Box::new(BlendRenderer::new(window, &config)?);
///
/// timer.tick();
/// backend.update(&mut input_system, &timer)?;
/// backend.draw()?;
/// ```
pub trait RenderBackend {
    /// 获取窗口的引用
    fn window(&self) -> &Window;

    /// 窗口尺寸变化时调用
    ///
    /// 会先刷新命令队列，确保 GPU 不再引用旧的缓冲区。
    fn resize(&mut self) -> Result<()>;

    /// 更新一帧的状态
    ///
    /// 切换到下一个帧资源时，如果 GPU 还在使用它会在这里等待。
    fn update(&mut self, input_system: &mut InputSystem, timer: &GameTimer) -> Result<()>;

    /// 渲染一帧画面
    fn draw(&mut self) -> Result<()>;

    /// 后端名称，用于日志和窗口标题
    fn backend_name(&self) -> &'static str;
}
