//! 渲染管线
//!
//! 着色器编译、根签名、输入布局、PSO 预设以及采样器转换。
//! 预设与 d3dx12.h 中 `CD3DX12_*_DESC(D3D12_DEFAULT)` 的默认值一致。

use std::ffi::CString;

use windows::core::PCSTR;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::context::{BACK_BUFFER_FORMAT, DEPTH_STENCIL_FORMAT};
use super::creation_error;
use crate::core::error::{GraphicsError, Result};
use crate::engine_debug;
use crate::renderer::sampler::{static_samplers, BORDER_COLOR, MAX_ANISOTROPY};
use crate::renderer::{AddressMode, FilterMode, SamplerSettings, ShaderProgram};

/// 根参数槽位，箱子示例和混合示例共用
pub const ROOT_SRV_TABLE: u32 = 0;
pub const ROOT_OBJECT_CBV: u32 = 1;
pub const ROOT_PASS_CBV: u32 = 2;
pub const ROOT_MATERIAL_CBV: u32 = 3;
/// 只有箱子示例有采样器表
pub const ROOT_SAMPLER_TABLE: u32 = 4;

fn blob_bytes(blob: &ID3DBlob) -> &[u8] {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }
}

fn c_string(text: &str) -> Result<CString> {
    CString::new(text).map_err(|e| GraphicsError::ShaderCompilation(format!("Invalid string '{}': {}", text, e)).into())
}

/// 用 FXC 编译一个着色器
///
/// Debug 构建带调试信息并跳过优化。
pub fn compile_shader(program: &ShaderProgram) -> Result<ID3DBlob> {
    let source = program.source.text();
    let source_name = c_string(program.source.file_name())?;
    let entry_point = c_string(program.entry_point)?;
    let target = c_string(program.stage.target())?;

    let define_strings = program
        .defines
        .iter()
        .map(|m| Ok((c_string(m.name)?, c_string(m.definition)?)))
        .collect::<Result<Vec<_>>>()?;

    // 以空条目结尾
    let mut macros: Vec<D3D_SHADER_MACRO> = define_strings
        .iter()
        .map(|(name, definition)| D3D_SHADER_MACRO {
            Name: PCSTR(name.as_ptr() as *const u8),
            Definition: PCSTR(definition.as_ptr() as *const u8),
        })
        .collect();
    macros.push(D3D_SHADER_MACRO {
        Name: PCSTR::null(),
        Definition: PCSTR::null(),
    });

    let flags = if cfg!(debug_assertions) {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        0
    };

    let mut code: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    let result = unsafe {
        D3DCompile(
            source.as_ptr() as *const _,
            source.len(),
            PCSTR(source_name.as_ptr() as *const u8),
            Some(macros.as_ptr()),
            None::<&ID3DInclude>,
            PCSTR(entry_point.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            flags,
            0,
            &mut code,
            Some(&mut errors),
        )
    };

    if let Err(e) = result {
        let message = errors
            .as_ref()
            .map(|blob| String::from_utf8_lossy(blob_bytes(blob)).into_owned())
            .unwrap_or_else(|| format!("{:?}", e));
        return Err(GraphicsError::ShaderCompilation(format!("{}: {}", program.label(), message)).into());
    }

    engine_debug!(shader = %program.label(), "Shader compiled");
    code.ok_or_else(|| {
        GraphicsError::ShaderCompilation(format!("{}: compiler returned no code", program.label())).into()
    })
}

/// 着色器字节码
pub fn shader_bytecode(blob: &ID3DBlob) -> D3D12_SHADER_BYTECODE {
    unsafe {
        D3D12_SHADER_BYTECODE {
            pShaderBytecode: blob.GetBufferPointer(),
            BytecodeLength: blob.GetBufferSize(),
        }
    }
}

/// 描述符范围，寄存器空间 0，追加在表的末尾
pub fn descriptor_range(
    range_type: D3D12_DESCRIPTOR_RANGE_TYPE,
    num_descriptors: u32,
    base_register: u32,
) -> D3D12_DESCRIPTOR_RANGE {
    D3D12_DESCRIPTOR_RANGE {
        RangeType: range_type,
        NumDescriptors: num_descriptors,
        BaseShaderRegister: base_register,
        RegisterSpace: 0,
        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
    }
}

/// 描述符表根参数
///
/// 只保存 `ranges` 的指针，序列化之前 `ranges` 必须保持有效。
pub fn root_descriptor_table(ranges: &[D3D12_DESCRIPTOR_RANGE]) -> D3D12_ROOT_PARAMETER {
    D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                NumDescriptorRanges: ranges.len() as u32,
                pDescriptorRanges: ranges.as_ptr(),
            },
        },
        ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
    }
}

/// 根描述符形式的常量缓冲 `b{register}`
pub fn root_cbv(register: u32) -> D3D12_ROOT_PARAMETER {
    D3D12_ROOT_PARAMETER {
        ParameterType: D3D12_ROOT_PARAMETER_TYPE_CBV,
        Anonymous: D3D12_ROOT_PARAMETER_0 {
            Descriptor: D3D12_ROOT_DESCRIPTOR {
                ShaderRegister: register,
                RegisterSpace: 0,
            },
        },
        ShaderVisibility: D3D12_SHADER_VISIBILITY_ALL,
    }
}

/// 序列化并创建根签名
pub fn serialize_root_signature(
    device: &ID3D12Device,
    parameters: &[D3D12_ROOT_PARAMETER],
    static_samplers: &[D3D12_STATIC_SAMPLER_DESC],
) -> Result<ID3D12RootSignature> {
    let desc = D3D12_ROOT_SIGNATURE_DESC {
        NumParameters: parameters.len() as u32,
        pParameters: parameters.as_ptr(),
        NumStaticSamplers: static_samplers.len() as u32,
        pStaticSamplers: static_samplers.as_ptr(),
        Flags: D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
    };

    let mut signature: Option<ID3DBlob> = None;
    let mut errors: Option<ID3DBlob> = None;
    unsafe {
        if let Err(e) =
            D3D12SerializeRootSignature(&desc, D3D_ROOT_SIGNATURE_VERSION_1, &mut signature, Some(&mut errors))
        {
            let message = errors
                .as_ref()
                .map(|blob| String::from_utf8_lossy(blob_bytes(blob)).into_owned())
                .unwrap_or_else(|| format!("{:?}", e));
            return Err(GraphicsError::ResourceCreation(format!(
                "Failed to serialize root signature: {}",
                message
            ))
            .into());
        }

        let signature = signature.ok_or_else(|| {
            GraphicsError::ResourceCreation("Root signature blob is null".to_string())
        })?;
        device
            .CreateRootSignature(0, blob_bytes(&signature))
            .map_err(creation_error("Failed to create root signature"))
    }
}

fn input_element(
    semantic: PCSTR,
    format: DXGI_FORMAT,
    slot: u32,
    offset: u32,
) -> D3D12_INPUT_ELEMENT_DESC {
    D3D12_INPUT_ELEMENT_DESC {
        SemanticName: semantic,
        SemanticIndex: 0,
        Format: format,
        InputSlot: slot,
        AlignedByteOffset: offset,
        InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
        InstanceDataStepRate: 0,
    }
}

/// 方块示例：位置和颜色各占一个输入槽
pub fn box_input_layout() -> [D3D12_INPUT_ELEMENT_DESC; 2] {
    [
        input_element(windows::core::s!("POSITION"), DXGI_FORMAT_R32G32B32_FLOAT, 0, 0),
        input_element(windows::core::s!("COLOR"), DXGI_FORMAT_R32G32B32A32_FLOAT, 1, 0),
    ]
}

/// `TexVertex` 的输入布局
pub fn tex_vertex_input_layout() -> [D3D12_INPUT_ELEMENT_DESC; 3] {
    use crate::geometry::TexVertex;
    [
        input_element(
            windows::core::s!("POSITION"),
            DXGI_FORMAT_R32G32B32_FLOAT,
            0,
            TexVertex::POSITION_OFFSET,
        ),
        input_element(
            windows::core::s!("NORMAL"),
            DXGI_FORMAT_R32G32B32_FLOAT,
            0,
            TexVertex::NORMAL_OFFSET,
        ),
        input_element(
            windows::core::s!("TEXCOORD"),
            DXGI_FORMAT_R32G32_FLOAT,
            0,
            TexVertex::TEXCOORD_OFFSET,
        ),
    ]
}

/// 不混合，写入全部颜色通道
pub fn opaque_render_target_blend() -> D3D12_RENDER_TARGET_BLEND_DESC {
    D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: false.into(),
        LogicOpEnable: false.into(),
        SrcBlend: D3D12_BLEND_ONE,
        DestBlend: D3D12_BLEND_ZERO,
        BlendOp: D3D12_BLEND_OP_ADD,
        SrcBlendAlpha: D3D12_BLEND_ONE,
        DestBlendAlpha: D3D12_BLEND_ZERO,
        BlendOpAlpha: D3D12_BLEND_OP_ADD,
        LogicOp: D3D12_LOGIC_OP_NOOP,
        RenderTargetWriteMask: D3D12_COLOR_WRITE_ENABLE_ALL.0 as u8,
    }
}

/// SrcAlpha / InvSrcAlpha 透明混合
pub fn transparent_render_target_blend() -> D3D12_RENDER_TARGET_BLEND_DESC {
    D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: true.into(),
        SrcBlend: D3D12_BLEND_SRC_ALPHA,
        DestBlend: D3D12_BLEND_INV_SRC_ALPHA,
        ..opaque_render_target_blend()
    }
}

/// One / One 加法混合，alpha 保持目标值
pub fn additive_render_target_blend() -> D3D12_RENDER_TARGET_BLEND_DESC {
    D3D12_RENDER_TARGET_BLEND_DESC {
        BlendEnable: true.into(),
        SrcBlend: D3D12_BLEND_ONE,
        DestBlend: D3D12_BLEND_ONE,
        SrcBlendAlpha: D3D12_BLEND_ZERO,
        DestBlendAlpha: D3D12_BLEND_ONE,
        ..opaque_render_target_blend()
    }
}

pub fn default_blend_desc() -> D3D12_BLEND_DESC {
    D3D12_BLEND_DESC {
        AlphaToCoverageEnable: false.into(),
        IndependentBlendEnable: false.into(),
        RenderTarget: [opaque_render_target_blend(); 8],
    }
}

fn keep_stencil_op() -> D3D12_DEPTH_STENCILOP_DESC {
    D3D12_DEPTH_STENCILOP_DESC {
        StencilFailOp: D3D12_STENCIL_OP_KEEP,
        StencilDepthFailOp: D3D12_STENCIL_OP_KEEP,
        StencilPassOp: D3D12_STENCIL_OP_KEEP,
        StencilFunc: D3D12_COMPARISON_FUNC_ALWAYS,
    }
}

/// 深度测试 LESS，写深度，不用模板
pub fn default_depth_stencil_desc() -> D3D12_DEPTH_STENCIL_DESC {
    D3D12_DEPTH_STENCIL_DESC {
        DepthEnable: true.into(),
        DepthWriteMask: D3D12_DEPTH_WRITE_MASK_ALL,
        DepthFunc: D3D12_COMPARISON_FUNC_LESS,
        StencilEnable: false.into(),
        StencilReadMask: D3D12_DEFAULT_STENCIL_READ_MASK as u8,
        StencilWriteMask: D3D12_DEFAULT_STENCIL_WRITE_MASK as u8,
        FrontFace: keep_stencil_op(),
        BackFace: keep_stencil_op(),
    }
}

/// 实心填充，背面剔除
pub fn default_rasterizer_desc() -> D3D12_RASTERIZER_DESC {
    D3D12_RASTERIZER_DESC {
        FillMode: D3D12_FILL_MODE_SOLID,
        CullMode: D3D12_CULL_MODE_BACK,
        FrontCounterClockwise: false.into(),
        DepthBias: D3D12_DEFAULT_DEPTH_BIAS as i32,
        DepthBiasClamp: D3D12_DEFAULT_DEPTH_BIAS_CLAMP,
        SlopeScaledDepthBias: D3D12_DEFAULT_SLOPE_SCALED_DEPTH_BIAS,
        DepthClipEnable: true.into(),
        MultisampleEnable: false.into(),
        AntialiasedLineEnable: false.into(),
        ForcedSampleCount: 0,
        ConservativeRaster: D3D12_CONSERVATIVE_RASTERIZATION_MODE_OFF,
    }
}

/// 三角形列表、单个渲染目标、默认状态的 PSO 描述
///
/// 描述里只保存指针：`input_layout`、`vs`、`ps` 在创建 PSO 之前必须保持有效。
pub fn default_pso_desc(
    root_signature: &ID3D12RootSignature,
    input_layout: &[D3D12_INPUT_ELEMENT_DESC],
    vs: &ID3DBlob,
    ps: &ID3DBlob,
) -> D3D12_GRAPHICS_PIPELINE_STATE_DESC {
    let mut desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
        pRootSignature: unsafe { std::mem::transmute_copy(root_signature) },
        VS: shader_bytecode(vs),
        PS: shader_bytecode(ps),
        BlendState: default_blend_desc(),
        SampleMask: u32::MAX,
        RasterizerState: default_rasterizer_desc(),
        DepthStencilState: default_depth_stencil_desc(),
        InputLayout: D3D12_INPUT_LAYOUT_DESC {
            pInputElementDescs: input_layout.as_ptr(),
            NumElements: input_layout.len() as u32,
        },
        PrimitiveTopologyType: D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
        NumRenderTargets: 1,
        DSVFormat: DEPTH_STENCIL_FORMAT,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        ..Default::default()
    };
    desc.RTVFormats[0] = BACK_BUFFER_FORMAT;
    desc
}

/// 像素重绘模式：不写颜色，每次光栅化都让模板值饱和加一
pub fn apply_pixel_overdraw(desc: &mut D3D12_GRAPHICS_PIPELINE_STATE_DESC) {
    desc.BlendState.RenderTarget[0].RenderTargetWriteMask = 0;

    let count = D3D12_DEPTH_STENCILOP_DESC {
        StencilFailOp: D3D12_STENCIL_OP_INCR_SAT,
        StencilDepthFailOp: D3D12_STENCIL_OP_INCR_SAT,
        StencilPassOp: D3D12_STENCIL_OP_INCR_SAT,
        StencilFunc: D3D12_COMPARISON_FUNC_ALWAYS,
    };

    let ds = &mut desc.DepthStencilState;
    ds.StencilEnable = true.into();
    ds.StencilReadMask = 0xff;
    ds.StencilWriteMask = 0xff;
    // 不剔除背面的物体也要计数
    ds.FrontFace = count;
    ds.BackFace = count;
}

pub fn create_pso(
    device: &ID3D12Device,
    desc: &D3D12_GRAPHICS_PIPELINE_STATE_DESC,
    name: &str,
) -> Result<ID3D12PipelineState> {
    let pso: ID3D12PipelineState = unsafe {
        device.CreateGraphicsPipelineState(desc).map_err(|e| {
            GraphicsError::ResourceCreation(format!("Failed to create PSO '{}': {:?}", name, e))
        })?
    };
    engine_debug!(pso = name, "Pipeline state created");
    Ok(pso)
}

pub fn d3d12_filter(filter: FilterMode) -> D3D12_FILTER {
    match filter {
        FilterMode::Point => D3D12_FILTER_MIN_MAG_MIP_POINT,
        FilterMode::Linear => D3D12_FILTER_MIN_MAG_MIP_LINEAR,
        FilterMode::Anisotropic => D3D12_FILTER_ANISOTROPIC,
    }
}

pub fn d3d12_address(address: AddressMode) -> D3D12_TEXTURE_ADDRESS_MODE {
    match address {
        AddressMode::Wrap => D3D12_TEXTURE_ADDRESS_MODE_WRAP,
        AddressMode::Clamp => D3D12_TEXTURE_ADDRESS_MODE_CLAMP,
        AddressMode::Border => D3D12_TEXTURE_ADDRESS_MODE_BORDER,
        AddressMode::Mirror => D3D12_TEXTURE_ADDRESS_MODE_MIRROR,
    }
}

/// 混合示例根签名里的 6 个静态采样器
pub fn static_sampler_descs() -> [D3D12_STATIC_SAMPLER_DESC; 6] {
    static_samplers().map(|s| {
        let address = d3d12_address(s.address);
        D3D12_STATIC_SAMPLER_DESC {
            Filter: d3d12_filter(s.filter),
            AddressU: address,
            AddressV: address,
            AddressW: address,
            MipLODBias: 0.0,
            MaxAnisotropy: s.max_anisotropy,
            ComparisonFunc: D3D12_COMPARISON_FUNC_LESS_EQUAL,
            BorderColor: D3D12_STATIC_BORDER_COLOR_OPAQUE_WHITE,
            MinLOD: 0.0,
            MaxLOD: D3D12_FLOAT32_MAX,
            ShaderRegister: s.register,
            RegisterSpace: 0,
            ShaderVisibility: D3D12_SHADER_VISIBILITY_PIXEL,
        }
    })
}

/// 箱子示例运行时切换的采样器
pub fn sampler_desc(settings: &SamplerSettings) -> D3D12_SAMPLER_DESC {
    let address = d3d12_address(settings.address());
    D3D12_SAMPLER_DESC {
        Filter: d3d12_filter(settings.filter()),
        AddressU: address,
        AddressV: address,
        AddressW: address,
        MipLODBias: 0.0,
        MaxAnisotropy: MAX_ANISOTROPY,
        ComparisonFunc: D3D12_COMPARISON_FUNC_ALWAYS,
        BorderColor: BORDER_COLOR,
        MinLOD: 0.0,
        MaxLOD: f32::MAX,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampler_conversion() {
        let mut settings = SamplerSettings::new();
        settings.set_filter(FilterMode::Anisotropic);
        settings.set_address(AddressMode::Border);

        let desc = sampler_desc(&settings);
        assert_eq!(desc.Filter, D3D12_FILTER_ANISOTROPIC);
        assert_eq!(desc.AddressV, D3D12_TEXTURE_ADDRESS_MODE_BORDER);
        assert_eq!(desc.MaxAnisotropy, 16);
        assert_eq!(desc.BorderColor, [1.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_static_samplers() {
        let descs = static_sampler_descs();
        assert_eq!(descs[0].Filter, D3D12_FILTER_MIN_MAG_MIP_POINT);
        assert_eq!(descs[3].AddressU, D3D12_TEXTURE_ADDRESS_MODE_CLAMP);
        assert_eq!(descs[4].Filter, D3D12_FILTER_ANISOTROPIC);
        assert_eq!(descs[5].ShaderRegister, 5);
    }

    #[test]
    fn test_blend_presets() {
        let transparent = transparent_render_target_blend();
        assert_eq!(transparent.SrcBlend, D3D12_BLEND_SRC_ALPHA);
        assert_eq!(transparent.DestBlend, D3D12_BLEND_INV_SRC_ALPHA);

        let additive = additive_render_target_blend();
        assert_eq!(additive.SrcBlend, D3D12_BLEND_ONE);
        assert_eq!(additive.DestBlend, D3D12_BLEND_ONE);
        assert_eq!(additive.DestBlendAlpha, D3D12_BLEND_ONE);
    }

    #[test]
    fn test_compile_overdraw_shaders() {
        assert!(compile_shader(&ShaderProgram::FULL_SCREEN_QUAD_VS).is_ok());
        assert!(compile_shader(&ShaderProgram::PIXEL_OVERDRAW_PS).is_ok());
    }
}
