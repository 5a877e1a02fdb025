//! 错误处理模块
//!
//! 定义了各个示例程序共用的错误类型。
//!
//! # 设计原则
//!
//! - 为每种错误类型提供清晰的上下文信息
//! - 图形 API 失败时携带 HRESULT 描述，着色器编译失败时携带编译器输出
//! - 易于模式匹配和错误处理

use std::fmt;
use std::path::PathBuf;

/// 统一的 Result 类型
///
/// 所有可能返回错误的函数都应该使用这个类型。
pub type Result<T> = std::result::Result<T, DemoError>;

/// 示例程序的错误类型
#[derive(Debug)]
pub enum DemoError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// 纹理加载错误
    Texture(TextureError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),

    /// 运行时错误
    Runtime(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 着色器编译失败
    ShaderCompilation(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 渲染命令执行失败
    CommandExecution(String),
}

/// 纹理加载相关的错误
#[derive(Debug)]
pub enum TextureError {
    /// 文件不存在
    FileNotFound(PathBuf),

    /// 解码失败
    Decode { path: PathBuf, reason: String },

    /// 不支持的像素格式或尺寸
    UnsupportedFormat(String),
}

impl fmt::Display for DemoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemoError::Config(e) => write!(f, "Configuration error: {}", e),
            DemoError::Graphics(e) => write!(f, "Graphics error: {}", e),
            DemoError::Texture(e) => write!(f, "Texture error: {}", e),
            DemoError::Io(e) => write!(f, "IO error: {}", e),
            DemoError::Log(msg) => write!(f, "Log error: {}", msg),
            DemoError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
            DemoError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
        }
    }
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureError::FileNotFound(path) => write!(f, "Texture file not found: {}", path.display()),
            TextureError::Decode { path, reason } => {
                write!(f, "Failed to decode '{}': {}", path.display(), reason)
            }
            TextureError::UnsupportedFormat(msg) => write!(f, "Unsupported texture: {}", msg),
        }
    }
}

impl std::error::Error for DemoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DemoError::Io(e) => Some(e),
            DemoError::Config(e) => Some(e),
            DemoError::Graphics(e) => Some(e),
            DemoError::Texture(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}
impl std::error::Error for TextureError {}

// 实现 From trait 以便于错误转换
impl From<std::io::Error> for DemoError {
    fn from(err: std::io::Error) -> Self {
        DemoError::Io(err)
    }
}

impl From<ConfigError> for DemoError {
    fn from(err: ConfigError) -> Self {
        DemoError::Config(err)
    }
}

impl From<GraphicsError> for DemoError {
    fn from(err: GraphicsError) -> Self {
        DemoError::Graphics(err)
    }
}

impl From<TextureError> for DemoError {
    fn from(err: TextureError) -> Self {
        DemoError::Texture(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_includes_context() {
        let err: DemoError = GraphicsError::ShaderCompilation("default.hlsl: X3000".to_string()).into();
        let text = err.to_string();
        assert!(text.starts_with("Graphics error"));
        assert!(text.contains("X3000"));
    }

    #[test]
    fn test_source_chain() {
        let err: DemoError = TextureError::FileNotFound(PathBuf::from("textures/grass.dds")).into();
        assert!(err.source().is_some());

        let err = DemoError::Runtime("lost device".to_string());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DemoError = io.into();
        assert!(matches!(err, DemoError::Io(_)));
    }
}
