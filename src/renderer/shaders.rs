//! 着色器定义
//!
//! HLSL 源码在编译期通过 `include_str!` 嵌入，运行时由 D3DCompile 编译。
//! `lighting_util.hlsl` 不走 `#include`，直接拼接在 `default.hlsl` / `flare.hlsl` 前面。
//!
//! # 着色器变体
//!
//! | 名称 | 文件 | 入口 | 宏 |
//! |------|------|------|----|
//! | 方块 | color.hlsl | VS / PS | 无 |
//! | 箱子 | default.hlsl | VS / PS | DYNAMIC_SAMPLER |
//! | 光晕 | flare.hlsl | VS / PS | 无 |
//! | 不透明 | default.hlsl | VS / PS | FOG |
//! | alpha 测试 | default.hlsl | PS | FOG, ALPHA_TEST |
//! | 闪电 | default.hlsl | PS | FOG, ADDITIVE_BLENDING_WITH_FOG |
//! | 像素重绘 | default.hlsl | VS_FullScreenQuad / PS_PixelOverdraw | PIXEL_OVERDRAW |

use std::borrow::Cow;

use super::render_item::RenderLayer;

pub const COLOR_HLSL: &str = include_str!("shaders/color.hlsl");
pub const DEFAULT_HLSL: &str = include_str!("shaders/default.hlsl");
pub const FLARE_HLSL: &str = include_str!("shaders/flare.hlsl");
pub const LIGHTING_UTIL_HLSL: &str = include_str!("shaders/lighting_util.hlsl");

/// 着色器源文件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderSource {
    Color,
    Default,
    Flare,
}

impl ShaderSource {
    /// 文件名（用于编译错误信息）
    pub fn file_name(&self) -> &'static str {
        match self {
            ShaderSource::Color => "color.hlsl",
            ShaderSource::Default => "default.hlsl",
            ShaderSource::Flare => "flare.hlsl",
        }
    }

    /// 完整的源码，需要光照函数的文件会拼接 `lighting_util.hlsl`
    pub fn text(&self) -> Cow<'static, str> {
        match self {
            ShaderSource::Color => Cow::Borrowed(COLOR_HLSL),
            ShaderSource::Default => Cow::Owned(format!("{}\n{}", LIGHTING_UTIL_HLSL, DEFAULT_HLSL)),
            ShaderSource::Flare => Cow::Owned(format!("{}\n{}", LIGHTING_UTIL_HLSL, FLARE_HLSL)),
        }
    }
}

/// 着色器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
}

impl ShaderStage {
    /// Shader Model 5.0 编译目标
    pub fn target(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Pixel => "ps_5_0",
        }
    }
}

/// 预处理宏
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderMacro {
    pub name: &'static str,
    pub definition: &'static str,
}

impl ShaderMacro {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            definition: "1",
        }
    }
}

const FOG: ShaderMacro = ShaderMacro::new("FOG");
const ALPHA_TEST: ShaderMacro = ShaderMacro::new("ALPHA_TEST");
const ADDITIVE_BLENDING_WITH_FOG: ShaderMacro = ShaderMacro::new("ADDITIVE_BLENDING_WITH_FOG");
const DYNAMIC_SAMPLER: ShaderMacro = ShaderMacro::new("DYNAMIC_SAMPLER");
const PIXEL_OVERDRAW: ShaderMacro = ShaderMacro::new("PIXEL_OVERDRAW");

/// 各变体使用的宏集合
pub struct ShaderDefines;

impl ShaderDefines {
    pub const NONE: &'static [ShaderMacro] = &[];
    pub const OPAQUE: &'static [ShaderMacro] = &[FOG];
    pub const ALPHA_TESTED: &'static [ShaderMacro] = &[FOG, ALPHA_TEST];
    pub const ANIMATED_BOLT: &'static [ShaderMacro] = &[FOG, ADDITIVE_BLENDING_WITH_FOG];
    pub const CRATE: &'static [ShaderMacro] = &[DYNAMIC_SAMPLER];
    pub const PIXEL_OVERDRAW: &'static [ShaderMacro] = &[PIXEL_OVERDRAW];

    /// 混合示例中各渲染层的像素着色器宏
    ///
    /// 透明层与不透明层共用同一个像素着色器。
    pub fn for_layer(layer: RenderLayer) -> &'static [ShaderMacro] {
        match layer {
            RenderLayer::Opaque | RenderLayer::Transparent => Self::OPAQUE,
            RenderLayer::AlphaTested => Self::ALPHA_TESTED,
            RenderLayer::AnimatedBolt => Self::ANIMATED_BOLT,
        }
    }
}

/// 一次着色器编译所需的全部参数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShaderProgram {
    pub source: ShaderSource,
    pub entry_point: &'static str,
    pub stage: ShaderStage,
    pub defines: &'static [ShaderMacro],
}

impl ShaderProgram {
    pub const fn new(
        source: ShaderSource,
        entry_point: &'static str,
        stage: ShaderStage,
        defines: &'static [ShaderMacro],
    ) -> Self {
        Self {
            source,
            entry_point,
            stage,
            defines,
        }
    }

    pub const BOX_VS: Self = Self::new(ShaderSource::Color, "VS", ShaderStage::Vertex, ShaderDefines::NONE);
    pub const BOX_PS: Self = Self::new(ShaderSource::Color, "PS", ShaderStage::Pixel, ShaderDefines::NONE);

    pub const CRATE_VS: Self = Self::new(ShaderSource::Default, "VS", ShaderStage::Vertex, ShaderDefines::CRATE);
    pub const CRATE_PS: Self = Self::new(ShaderSource::Default, "PS", ShaderStage::Pixel, ShaderDefines::CRATE);
    pub const FLARE_VS: Self = Self::new(ShaderSource::Flare, "VS", ShaderStage::Vertex, ShaderDefines::NONE);
    pub const FLARE_PS: Self = Self::new(ShaderSource::Flare, "PS", ShaderStage::Pixel, ShaderDefines::NONE);

    pub const STANDARD_VS: Self =
        Self::new(ShaderSource::Default, "VS", ShaderStage::Vertex, ShaderDefines::NONE);
    pub const FULL_SCREEN_QUAD_VS: Self = Self::new(
        ShaderSource::Default,
        "VS_FullScreenQuad",
        ShaderStage::Vertex,
        ShaderDefines::PIXEL_OVERDRAW,
    );
    pub const PIXEL_OVERDRAW_PS: Self = Self::new(
        ShaderSource::Default,
        "PS_PixelOverdraw",
        ShaderStage::Pixel,
        ShaderDefines::PIXEL_OVERDRAW,
    );

    /// 混合示例中渲染层对应的像素着色器
    pub fn layer_ps(layer: RenderLayer) -> Self {
        Self::new(
            ShaderSource::Default,
            "PS",
            ShaderStage::Pixel,
            ShaderDefines::for_layer(layer),
        )
    }

    /// 日志和错误信息中使用的名称，例如 `default.hlsl:PS[FOG,ALPHA_TEST]`
    pub fn label(&self) -> String {
        let defines: Vec<&str> = self.defines.iter().map(|m| m.name).collect();
        format!(
            "{}:{}[{}]",
            self.source.file_name(),
            self.entry_point,
            defines.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_is_prepended() {
        let text = ShaderSource::Default.text();
        assert!(text.starts_with(LIGHTING_UTIL_HLSL));
        assert!(text.contains("float4 PS(VertexOut pin)"));
        assert!(ShaderSource::Flare.text().contains("ComputeLighting"));
        assert!(!ShaderSource::Color.text().contains("ComputeLighting"));
    }

    #[test]
    fn test_entry_points_exist() {
        let programs = [
            ShaderProgram::BOX_VS,
            ShaderProgram::BOX_PS,
            ShaderProgram::CRATE_PS,
            ShaderProgram::FLARE_PS,
            ShaderProgram::STANDARD_VS,
            ShaderProgram::FULL_SCREEN_QUAD_VS,
            ShaderProgram::PIXEL_OVERDRAW_PS,
        ];
        for program in programs {
            let text = program.source.text();
            assert!(text.contains(&format!(" {}(", program.entry_point)), "{}", program.label());
        }
    }

    #[test]
    fn test_layer_defines() {
        assert_eq!(ShaderDefines::for_layer(RenderLayer::Opaque), &[FOG]);
        assert_eq!(ShaderDefines::for_layer(RenderLayer::Transparent), &[FOG]);
        assert_eq!(ShaderDefines::for_layer(RenderLayer::AlphaTested), &[FOG, ALPHA_TEST]);
        assert_eq!(
            ShaderDefines::for_layer(RenderLayer::AnimatedBolt),
            &[FOG, ADDITIVE_BLENDING_WITH_FOG]
        );
    }

    #[test]
    fn test_macros_are_used_in_source() {
        for name in ["FOG", "ALPHA_TEST", "ADDITIVE_BLENDING_WITH_FOG", "DYNAMIC_SAMPLER", "PIXEL_OVERDRAW"] {
            assert!(DEFAULT_HLSL.contains(&format!("#ifdef {}", name)), "{}", name);
        }
    }

    #[test]
    fn test_label() {
        let program = ShaderProgram::layer_ps(RenderLayer::AlphaTested);
        assert_eq!(program.label(), "default.hlsl:PS[FOG,ALPHA_TEST]");
        assert_eq!(ShaderStage::Vertex.target(), "vs_5_0");
    }
}
