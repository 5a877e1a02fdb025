//! dx12_demos - Direct3D 12 示例程序入口
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件（config.toml）中的示例
//! cargo run
//!
//! # 命令行选择示例
//! cargo run -- --demo blend --assets textures
//! ```
//!
//! # 操作
//!
//! - 左键拖动：环绕相机
//! - 右键拖动：缩放
//! - Esc：退出
//! - 各示例的按键见 `demos` 模块

use anyhow::Context;
use dx12_demos::{app_info, app_warn};
use dx12_demos::core::{log, Config};

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（config.toml），应用命令行参数并验证
/// 2. 初始化日志系统
/// 3. 创建事件循环和示例渲染器
/// 4. 启动主循环
fn main() -> anyhow::Result<()> {
    let mut config = Config::from_file_or_default("config.toml");
    let rejected_demo = config.apply_args(std::env::args());
    config.validate().context("Invalid configuration")?;

    let log_file = if config.logging.file_output {
        Some(config.logging.log_file.as_str())
    } else {
        None
    };
    log::init_logger(config.logging.level, config.logging.file_output, log_file);

    app_info!(version = env!("CARGO_PKG_VERSION"), "dx12_demos starting");
    if let Some(name) = rejected_demo {
        app_warn!(
            demo = %name,
            using = config.demo.kind.name(),
            "Unknown demo name ignored (expected box, crate or blend)"
        );
    }
    app_info!(
        demo = config.demo.kind.name(),
        width = config.window.width,
        height = config.window.height,
        vsync = config.graphics.vsync,
        assets = %config.demo.asset_dir,
        "Configuration loaded"
    );

    run(config)
}

#[cfg(target_os = "windows")]
fn run(config: Config) -> anyhow::Result<()> {
    use dx12_demos::core::{DemoError, FrameStats, GameTimer, InputSystem};
    use dx12_demos::gfx::create_backend;
    use dx12_demos::app_error;
    use winit::event::{ElementState, Event, WindowEvent};
    use winit::event_loop::{ControlFlow, EventLoop};
    use winit::keyboard::{KeyCode, PhysicalKey};

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut backend = create_backend(&event_loop, &config).context("Failed to initialize demo")?;

    let title = format!("{} - {}", config.window.title, config.demo.kind.name());
    let mut input = InputSystem::new();
    let mut timer = GameTimer::new();
    let mut stats = FrameStats::new();
    let mut minimized = false;
    let mut failure: Option<DemoError> = None;

    app_info!(backend = backend.backend_name(), "Entering main loop");
    timer.reset();

    event_loop
        .run(|event, elwt| {
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        app_info!("Close requested, shutting down");
                        elwt.exit();
                    }
                    WindowEvent::KeyboardInput { event, .. } => {
                        if let PhysicalKey::Code(code) = event.physical_key {
                            if code == KeyCode::Escape && event.state == ElementState::Pressed {
                                elwt.exit();
                            }
                            input.on_keyboard_input(code, event.state, event.repeat);
                        }
                    }
                    WindowEvent::MouseInput { state, button, .. } => {
                        input.on_mouse_button(button, state);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        input.on_mouse_move((position.x, position.y));
                    }
                    // 失去焦点时暂停
                    WindowEvent::Focused(focused) => {
                        if focused {
                            timer.start();
                        } else {
                            timer.stop();
                            input.reset_mouse();
                        }
                    }
                    WindowEvent::Resized(size) => {
                        minimized = size.width == 0 || size.height == 0;
                        if !minimized {
                            if let Err(e) = backend.resize() {
                                app_error!(error = %e, "Resize failed");
                                failure = Some(e);
                                elwt.exit();
                            }
                        }
                    }
                    _ => (),
                },
                Event::AboutToWait => {
                    let paused = timer.is_stopped() || minimized;
                    elwt.set_control_flow(if paused { ControlFlow::Wait } else { ControlFlow::Poll });
                    if paused {
                        return;
                    }

                    timer.tick();
                    if stats.record_frame(timer.total_time()) {
                        backend.window().set_title(&stats.window_title(&title));
                    }

                    let frame = backend
                        .update(&mut input, &timer)
                        .and_then(|_| backend.draw());
                    if let Err(e) = frame {
                        app_error!(error = %e, "Frame failed");
                        failure = Some(e);
                        elwt.exit();
                    }
                }
                Event::LoopExiting => {
                    if failure.is_some() {
                        app_warn!("Main loop exiting after an error");
                    }
                }
                _ => (),
            }
        })
        .context("Event loop error")?;

    match failure {
        Some(e) => Err(e).context("Demo stopped"),
        None => Ok(()),
    }
}

#[cfg(not(target_os = "windows"))]
fn run(config: Config) -> anyhow::Result<()> {
    dx12_demos::app_error!(
        demo = config.demo.kind.name(),
        "Direct3D 12 demos can only run on Windows"
    );
    anyhow::bail!("Direct3D 12 is not available on this platform")
}
