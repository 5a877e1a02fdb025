//! 配置管理模块
//!
//! 提供示例程序配置的加载、解析和管理功能。
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 800
//! height = 600
//! title = "D3D12 Demos"
//! resizable = true
//!
//! [graphics]
//! vsync = true
//! msaa_samples = 1
//!
//! [logging]
//! level = "info"      # trace, debug, info, warn, error
//! file_output = false
//!
//! [demo]
//! kind = "blend"      # box, crate, blend
//! asset_dir = "textures"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, Result};

/// 示例程序配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,

    /// 示例选择
    #[serde(default)]
    pub demo: DemoConfig,
}

/// 窗口配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowConfig {
    /// 窗口宽度
    #[serde(default = "default_width")]
    pub width: u32,

    /// 窗口高度
    #[serde(default = "default_height")]
    pub height: u32,

    /// 窗口标题
    #[serde(default = "default_title")]
    pub title: String,

    /// 是否可调整大小
    #[serde(default = "default_resizable")]
    pub resizable: bool,
}

/// 图形配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// MSAA 采样数
    #[serde(default = "default_msaa")]
    pub msaa_samples: u32,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default = "default_file_output")]
    pub file_output: bool,

    /// 日志文件路径
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// 示例配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    /// 要运行的示例
    #[serde(default = "default_demo_kind")]
    pub kind: DemoKind,

    /// 纹理目录
    #[serde(default = "default_asset_dir")]
    pub asset_dir: String,
}

/// 示例类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DemoKind {
    /// 彩色立方体
    Box,
    /// 纹理木箱 + 旋转光斑
    Crate,
    /// 地形、水面、铁丝网箱与闪电动画
    Blend,
}

// 默认值函数
fn default_width() -> u32 { 800 }
fn default_height() -> u32 { 600 }
fn default_title() -> String { "D3D12 Demos".to_string() }
fn default_resizable() -> bool { true }
fn default_vsync() -> bool { true }
fn default_msaa() -> u32 { 1 }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_file_output() -> bool { false }
fn default_log_file() -> String { "dx12_demos.log".to_string() }
fn default_demo_kind() -> DemoKind { DemoKind::Crate }
fn default_asset_dir() -> String { "textures".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
            resizable: default_resizable(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            vsync: default_vsync(),
            msaa_samples: default_msaa(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: default_file_output(),
            log_file: default_log_file(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            kind: default_demo_kind(),
            asset_dir: default_asset_dir(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径
    ///
    /// # 返回值
    ///
    /// 成功返回 `Config` 实例，失败返回错误
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，如果文件不存在则使用默认配置
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::from_file(path).unwrap_or_default()
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--demo <box|crate|blend>`: 选择示例
    /// - `--width <value>`: 设置窗口宽度
    /// - `--height <value>`: 设置窗口高度
    /// - `--assets <dir>`: 纹理目录
    /// - `--no-vsync`: 关闭垂直同步
    ///
    /// 无法识别的示例名不会改变配置，原样返回给调用方；
    /// 此时日志系统还没有初始化，由调用方在初始化后记录。
    pub fn apply_args<I>(&mut self, args: I) -> Option<String>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        let mut rejected_demo = None;
        if let Some(name) = value_after(&args, "--demo") {
            match DemoKind::from_name(name) {
                Some(kind) => self.demo.kind = kind,
                None => rejected_demo = Some(name.to_string()),
            }
        }

        if let Some(width) = value_after(&args, "--width").and_then(|s| s.parse().ok()) {
            self.window.width = width;
        }

        if let Some(height) = value_after(&args, "--height").and_then(|s| s.parse().ok()) {
            self.window.height = height;
        }

        if let Some(dir) = value_after(&args, "--assets") {
            self.demo.asset_dir = dir.to_string();
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        rejected_demo
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if !matches!(self.graphics.msaa_samples, 1 | 2 | 4 | 8 | 16) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.msaa_samples".to_string(),
                reason: "MSAA samples must be 1, 2, 4, 8, or 16".to_string(),
            }.into());
        }

        if self.demo.asset_dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "demo.asset_dir".to_string(),
                reason: "Asset directory must not be empty".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn value_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1).map(|s| s.as_str())
}

impl DemoKind {
    /// 按名称解析（大小写不敏感）
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "box" => Some(DemoKind::Box),
            "crate" => Some(DemoKind::Crate),
            "blend" => Some(DemoKind::Blend),
            _ => None,
        }
    }

    /// 窗口标题中显示的名称
    pub fn name(&self) -> &'static str {
        match self {
            DemoKind::Box => "Box",
            DemoKind::Crate => "Crate",
            DemoKind::Blend => "Blend",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DemoError;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.demo.kind, DemoKind::Crate);
        assert_eq!(config.demo.asset_dir, "textures");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.msaa_samples = 3;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.demo.asset_dir = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args([
            "dx12_demos", "--demo", "Blend", "--width", "1280", "--height", "720",
            "--assets", "data/tex", "--no-vsync",
        ]);
        assert_eq!(config.demo.kind, DemoKind::Blend);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.demo.asset_dir, "data/tex");
        assert!(!config.graphics.vsync);
    }

    #[test]
    fn test_apply_args_ignores_bad_values() {
        let mut config = Config::default();
        let rejected =
            config.apply_args(["dx12_demos", "--demo", "teapot", "--width", "wide", "--height"]);
        assert_eq!(rejected.as_deref(), Some("teapot"));
        assert_eq!(config.demo.kind, DemoKind::Crate);
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
    }

    #[test]
    fn test_unknown_demo_keeps_current_kind() {
        let mut config = Config::default();
        config.demo.kind = DemoKind::Box;
        let rejected = config.apply_args(["dx12_demos", "--demo", "foo"]);
        assert_eq!(rejected, Some("foo".to_string()));
        assert_eq!(config.demo.kind, DemoKind::Box);

        let rejected = config.apply_args(["dx12_demos", "--demo", "crate"]);
        assert_eq!(rejected, None);
        assert_eq!(config.demo.kind, DemoKind::Crate);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str("[demo]\nkind = \"box\"\n").unwrap();
        assert_eq!(config.demo.kind, DemoKind::Box);
        assert_eq!(config.demo.asset_dir, "textures");
        assert_eq!(config.window.title, "D3D12 Demos");
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            Config::from_toml_str("[window\nwidth = 1"),
            Err(DemoError::Config(ConfigError::ParseError(_)))
        ));
        assert!(matches!(
            Config::from_file("definitely/not/here.toml"),
            Err(DemoError::Config(ConfigError::FileNotFound(path))) if path.ends_with("here.toml")
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("dx12_demos_config_{}.toml", std::process::id()));

        let mut config = Config::default();
        config.window.width = 1024;
        config.graphics.vsync = false;
        config.logging.level = LogLevel::Debug;
        config.demo.kind = DemoKind::Blend;
        config.demo.asset_dir = "assets/tex".to_string();
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path);
        let _ = std::fs::remove_file(&path);
        let loaded = loaded.unwrap();

        assert_eq!(loaded.window.width, 1024);
        assert_eq!(loaded.window.height, 600);
        assert!(!loaded.graphics.vsync);
        assert_eq!(loaded.logging.level, LogLevel::Debug);
        assert_eq!(loaded.demo.kind, DemoKind::Blend);
        assert_eq!(loaded.demo.asset_dir, "assets/tex");
    }
}
