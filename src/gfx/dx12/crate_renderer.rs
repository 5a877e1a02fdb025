//! 箱子示例渲染器
//!
//! 两个根签名：木箱用一个 SRV 的纹理表，光晕用两个（颜色 + alpha）。
//! 采样器放在着色器可见的采样器堆里，设置改变时重建描述符。
//!
//! # 根参数
//!
//! | 槽位 | 内容 |
//! |------|------|
//! | 0 | SRV 表（t0，光晕为 t0..t1） |
//! | 1 | 物体常量 b0 |
//! | 2 | 帧常量 b1 |
//! | 3 | 材质常量 b2 |
//! | 4 | 采样器表 s0 |

use std::path::Path;

use windows::Win32::Graphics::Direct3D12::*;
use winit::event_loop::EventLoop;
use winit::window::Window;

use super::buffer::MeshGeometry;
use super::context::Dx12Context;
use super::descriptor::Dx12DescriptorHeap;
use super::flush_on_drop;
use super::frame::{draw_render_item, upload_dirty_constants, FrameResource};
use super::pipeline::{
    compile_shader, create_pso, default_pso_desc, descriptor_range, root_cbv,
    root_descriptor_table, sampler_desc, serialize_root_signature, tex_vertex_input_layout,
    ROOT_PASS_CBV, ROOT_SAMPLER_TABLE,
};
use super::texture::{create_texture_srv, Dx12Texture};
use crate::core::error::{DemoError, Result};
use crate::core::{Config, GameTimer, InputSystem};
use crate::demos::crate_scene::{CRATE_TEXTURES, FLARE_ITEM, WOOD_CRATE_ITEM};
use crate::demos::{CrateScene, FillMode};
use crate::geometry::SubmeshGeometry;
use crate::renderer::{
    FrameResourceRing, RenderBackend, RenderItem, ShaderProgram, TextureData,
};
use crate::{engine_debug, engine_info, engine_trace};

/// 光晕纹理表里的 SRV 数量
const FLARE_SRV_COUNT: u32 = 2;

/// 一组按填充模式区分的 PSO
struct FillPipelines {
    solid: ID3D12PipelineState,
    wireframe: ID3D12PipelineState,
}

impl FillPipelines {
    fn create(
        device: &ID3D12Device,
        root_signature: &ID3D12RootSignature,
        vs: &ShaderProgram,
        ps: &ShaderProgram,
        name: &str,
    ) -> Result<Self> {
        let vs = compile_shader(vs)?;
        let ps = compile_shader(ps)?;
        let input_layout = tex_vertex_input_layout();

        let mut desc = default_pso_desc(root_signature, &input_layout, &vs, &ps);
        let solid = create_pso(device, &desc, name)?;

        desc.RasterizerState.FillMode = D3D12_FILL_MODE_WIREFRAME;
        let wireframe = create_pso(device, &desc, &format!("{}_wireframe", name))?;

        Ok(Self { solid, wireframe })
    }

    fn get(&self, fill_mode: FillMode) -> &ID3D12PipelineState {
        match fill_mode {
            FillMode::Solid => &self.solid,
            FillMode::Wireframe => &self.wireframe,
        }
    }
}

/// 箱子示例渲染器
pub struct CrateRenderer {
    scene: CrateScene,
    frames: FrameResourceRing<FrameResource>,

    srv_heap: Dx12DescriptorHeap,
    sampler_heap: Dx12DescriptorHeap,
    textures: Vec<Dx12Texture>,

    root_signature: ID3D12RootSignature,
    flare_root_signature: ID3D12RootSignature,
    opaque: FillPipelines,
    flare: FillPipelines,

    box_geo: MeshGeometry,

    context: Dx12Context,
}

impl CrateRenderer {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let context = Dx12Context::new(event_loop, config)?;
        let device = context.device.clone();
        let scene = CrateScene::new(context.width, context.height);

        context.reset_command_list(None)?;

        // 纹理
        let srv_heap = Dx12DescriptorHeap::new(
            &device,
            D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            CRATE_TEXTURES.len() as u32,
            true,
            "Crate SRV Heap",
        )?;
        let asset_dir = Path::new(&config.demo.asset_dir);
        let mut textures = Vec::with_capacity(CRATE_TEXTURES.len());
        for (index, file) in CRATE_TEXTURES.iter().enumerate() {
            let data = TextureData::load_or_fallback(&asset_dir.join(file));
            let texture = Dx12Texture::upload(&device, &context.command_list, &data)?;
            create_texture_srv(&device, &texture.resource, texture.format, srv_heap.cpu_handle(index));
            textures.push(texture);
        }

        let sampler_heap = Dx12DescriptorHeap::new(
            &device,
            D3D12_DESCRIPTOR_HEAP_TYPE_SAMPLER,
            1,
            true,
            "Crate Sampler Heap",
        )?;

        // 根签名
        let sampler_range = [descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_SAMPLER, 1, 0)];
        let texture_range = [descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_SRV, 1, 0)];
        let flare_range = [descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_SRV, FLARE_SRV_COUNT, 0)];

        let root_signature = serialize_root_signature(
            &device,
            &[
                root_descriptor_table(&texture_range),
                root_cbv(0),
                root_cbv(1),
                root_cbv(2),
                root_descriptor_table(&sampler_range),
            ],
            &[],
        )?;
        let flare_root_signature = serialize_root_signature(
            &device,
            &[
                root_descriptor_table(&flare_range),
                root_cbv(0),
                root_cbv(1),
                root_cbv(2),
                root_descriptor_table(&sampler_range),
            ],
            &[],
        )?;

        let opaque = FillPipelines::create(
            &device,
            &root_signature,
            &ShaderProgram::CRATE_VS,
            &ShaderProgram::CRATE_PS,
            "crate",
        )?;
        let flare = FillPipelines::create(
            &device,
            &flare_root_signature,
            &ShaderProgram::FLARE_VS,
            &ShaderProgram::FLARE_PS,
            "flare",
        )?;

        // 几何体
        let vertices = scene.box_vertices();
        let indices = scene.box_indices();
        let box_geo = MeshGeometry::new(&device, &context.command_list, "boxGeo", &vertices, &indices)?
            .with_submesh("box", SubmeshGeometry::new(indices.len() as u32, 0, 0));

        let object_count = scene.items().len();
        let material_count = scene.materials().len();
        let frames = FrameResourceRing::new(|_| FrameResource::new(&device, 1, object_count, material_count, 0))?;

        context.execute_command_list()?;
        context.flush()?;

        let mut renderer = Self {
            scene,
            frames,
            srv_heap,
            sampler_heap,
            textures,
            root_signature,
            flare_root_signature,
            opaque,
            flare,
            box_geo,
            context,
        };
        renderer.box_geo.dispose_uploaders();
        for texture in &mut renderer.textures {
            texture.dispose_uploader();
        }

        engine_info!(
            width = renderer.context.width,
            height = renderer.context.height,
            textures = CRATE_TEXTURES.len(),
            "Crate demo initialized"
        );
        Ok(renderer)
    }

    /// 采样器设置改变后重建描述符
    ///
    /// 采样器堆只有一个槽位，先等在途帧全部完成。
    fn update_sampler(&mut self) -> Result<()> {
        if !self.scene.sampler_mut().take_dirty() {
            return Ok(());
        }

        self.context.flush()?;
        let desc = sampler_desc(self.scene.sampler());
        unsafe {
            self.context
                .device
                .CreateSampler(&desc, self.sampler_heap.cpu_handle(0));
        }
        engine_debug!(
            filter = ?self.scene.sampler().filter(),
            address = ?self.scene.sampler().address(),
            "Sampler recreated"
        );
        Ok(())
    }

    fn draw_item(&self, item: &RenderItem) -> Result<()> {
        let material = self
            .scene
            .materials()
            .iter()
            .find(|m| m.name == item.material)
            .ok_or_else(|| DemoError::Runtime(format!("Unknown material '{}'", item.material)))?;

        draw_render_item(
            &self.context.command_list,
            &self.box_geo,
            item,
            material,
            self.frames.current(),
            &self.srv_heap,
        )
    }

    /// 切换根签名后重新绑定帧常量和采样器
    fn bind_root_signature(&self, root_signature: &ID3D12RootSignature) -> Result<()> {
        let frame = self.frames.current();
        let sampler = self.sampler_heap.gpu_handle(0)?;
        unsafe {
            let cmd = &self.context.command_list;
            cmd.SetGraphicsRootSignature(root_signature);
            cmd.SetGraphicsRootConstantBufferView(ROOT_PASS_CBV, frame.pass_cb.gpu_address(0));
            cmd.SetGraphicsRootDescriptorTable(ROOT_SAMPLER_TABLE, sampler);
        }
        Ok(())
    }
}

impl RenderBackend for CrateRenderer {
    fn window(&self) -> &Window {
        self.context.window()
    }

    fn resize(&mut self) -> Result<()> {
        self.context.resize()?;
        self.scene.resize(self.context.width, self.context.height);
        Ok(())
    }

    fn update(&mut self, input_system: &mut InputSystem, timer: &GameTimer) -> Result<()> {
        self.scene.handle_input(input_system);
        self.scene.animate(timer.total_time());

        self.frames.advance();
        if let Some(fence) = self.frames.fence_to_wait(self.context.completed_fence()) {
            engine_trace!(fence = fence.value(), "Waiting for frame resource");
            self.context.wait_for_fence(fence)?;
        }

        self.update_sampler()?;

        let pass = self.scene.pass_constants(self.context.size(), timer);
        let frame = self.frames.current_mut();
        frame.pass_cb.copy_data(0, &pass)?;

        let (items, materials) = self.scene.items_and_materials_mut();
        upload_dirty_constants(frame, items, materials)
    }

    fn draw(&mut self) -> Result<()> {
        let fill_mode = self.scene.fill_mode();
        let ctx = &self.context;
        let frame = self.frames.current();
        ctx.reset_command_list_with(&frame.cmd_list_alloc, Some(self.opaque.get(fill_mode)))?;

        let back_buffer = ctx.current_back_buffer()?.clone();
        let rtv = ctx.current_back_buffer_view();
        let dsv = ctx.depth_stencil_view();

        unsafe {
            let cmd = &ctx.command_list;
            cmd.RSSetViewports(&[ctx.viewport]);
            cmd.RSSetScissorRects(&[ctx.scissor_rect]);

            ctx.transition(&back_buffer, D3D12_RESOURCE_STATE_PRESENT, D3D12_RESOURCE_STATE_RENDER_TARGET);

            cmd.ClearRenderTargetView(rtv, &self.scene.clear_color().to_array(), None);
            cmd.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH | D3D12_CLEAR_FLAG_STENCIL, 1.0, 0, None);
            cmd.OMSetRenderTargets(1, Some(&rtv), true, Some(&dsv));

            cmd.SetDescriptorHeaps(&[
                Some(self.srv_heap.heap().clone()),
                Some(self.sampler_heap.heap().clone()),
            ]);
        }

        let items = self.scene.items();

        self.bind_root_signature(&self.root_signature)?;
        self.draw_item(&items[WOOD_CRATE_ITEM])?;

        unsafe {
            ctx.command_list.SetPipelineState(self.flare.get(fill_mode));
        }
        self.bind_root_signature(&self.flare_root_signature)?;
        self.draw_item(&items[FLARE_ITEM])?;

        ctx.transition(&back_buffer, D3D12_RESOURCE_STATE_RENDER_TARGET, D3D12_RESOURCE_STATE_PRESENT);
        drop(back_buffer);

        self.context.execute_command_list()?;
        self.context.present()?;

        let fence = self.context.signal()?;
        self.frames.mark_submitted(fence);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "DirectX 12"
    }
}

impl Drop for CrateRenderer {
    fn drop(&mut self) {
        // 帧资源释放前 GPU 必须用完它们
        flush_on_drop(self.context.flush(), "crate");
    }
}
