//! 混合示例渲染器
//!
//! 四个渲染层各用一个 PSO，根签名带 6 个静态采样器。
//! 水面顶点每帧写入当前帧资源的动态顶点缓冲。
//!
//! # 像素重绘模式
//!
//! 第一次切换到该模式时创建：重绘版本的场景 PSO、全屏四边形、
//! R8_UINT 纹理（SRV 在 [`OVERDRAW_SRV_INDEX`]）和四边形 PSO。
//! 每帧画完场景后把深度模板缓冲的模板平面（子资源 1）拷贝到纹理，
//! 再用四边形把计数映射成颜色。窗口大小改变时重建纹理。

use std::collections::HashMap;
use std::path::Path;

use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use winit::event_loop::EventLoop;
use winit::window::Window;

use super::buffer::MeshGeometry;
use super::context::{transition_barrier, Dx12Context};
use super::descriptor::Dx12DescriptorHeap;
use super::flush_on_drop;
use super::frame::{draw_render_item, upload_dirty_constants, FrameResource};
use super::pipeline::{
    additive_render_target_blend, apply_pixel_overdraw, compile_shader, create_pso,
    default_pso_desc, descriptor_range, root_cbv, root_descriptor_table, serialize_root_signature,
    static_sampler_descs, tex_vertex_input_layout, transparent_render_target_blend, ROOT_PASS_CBV,
    ROOT_SRV_TABLE,
};
use super::texture::{create_texture_2d, create_texture_srv, Dx12Texture};
use crate::core::error::{DemoError, Result};
use crate::core::{Config, GameTimer, InputSystem};
use crate::demos::blend_scene::{BLEND_TEXTURES, BOLT_SRV_OFFSET, OVERDRAW_SRV_INDEX, SRV_HEAP_SIZE};
use crate::demos::{BlendScene, DrawMode};
use crate::geometry::{GeometryGenerator, MeshData, SubmeshGeometry, TexVertex};
use crate::renderer::texture::bolt_frame_paths;
use crate::renderer::{
    FrameResourceRing, RenderBackend, RenderLayer, ShaderProgram, TextureData,
};
use crate::{engine_debug, engine_info, engine_trace};

const WATER_GEO: &str = "waterGeo";
const QUAD_SUBMESH: &str = "quad";

/// 每个渲染层一个 PSO
struct LayerPipelines {
    opaque: ID3D12PipelineState,
    transparent: ID3D12PipelineState,
    alpha_tested: ID3D12PipelineState,
    animated_bolt: ID3D12PipelineState,
}

impl LayerPipelines {
    /// `pixel_overdraw` 为真时创建只写模板的版本
    fn create(device: &ID3D12Device, root_signature: &ID3D12RootSignature, pixel_overdraw: bool) -> Result<Self> {
        let input_layout = tex_vertex_input_layout();
        let vs = compile_shader(&ShaderProgram::STANDARD_VS)?;
        let suffix = if pixel_overdraw { "_overdraw" } else { "" };

        let build = |layer: RenderLayer, name: &str| -> Result<ID3D12PipelineState> {
            let ps = compile_shader(&ShaderProgram::layer_ps(layer))?;
            let mut desc = default_pso_desc(root_signature, &input_layout, &vs, &ps);

            match layer {
                RenderLayer::Opaque => {}
                RenderLayer::Transparent => {
                    desc.BlendState.RenderTarget[0] = transparent_render_target_blend();
                }
                RenderLayer::AlphaTested => {
                    desc.RasterizerState.CullMode = D3D12_CULL_MODE_NONE;
                }
                RenderLayer::AnimatedBolt => {
                    desc.BlendState.RenderTarget[0] = additive_render_target_blend();
                    desc.RasterizerState.CullMode = D3D12_CULL_MODE_NONE;
                }
            }
            if pixel_overdraw {
                apply_pixel_overdraw(&mut desc);
            }

            create_pso(device, &desc, &format!("{}{}", name, suffix))
        };

        Ok(Self {
            opaque: build(RenderLayer::Opaque, "opaque")?,
            transparent: build(RenderLayer::Transparent, "transparent")?,
            alpha_tested: build(RenderLayer::AlphaTested, "alphaTested")?,
            animated_bolt: build(RenderLayer::AnimatedBolt, "animatedBolt")?,
        })
    }

    fn get(&self, layer: RenderLayer) -> &ID3D12PipelineState {
        match layer {
            RenderLayer::Opaque => &self.opaque,
            RenderLayer::Transparent => &self.transparent,
            RenderLayer::AlphaTested => &self.alpha_tested,
            RenderLayer::AnimatedBolt => &self.animated_bolt,
        }
    }
}

/// 像素重绘模式的资源，第一次进入该模式时创建
struct OverdrawResources {
    pipelines: LayerPipelines,
    quad_pso: ID3D12PipelineState,
    quad_geo: MeshGeometry,
    /// 模板计数的拷贝，平时处于 PIXEL_SHADER_RESOURCE 状态
    texture: ID3D12Resource,
}

/// 混合示例渲染器
pub struct BlendRenderer {
    scene: BlendScene,
    frames: FrameResourceRing<FrameResource>,

    srv_heap: Dx12DescriptorHeap,
    textures: Vec<Dx12Texture>,

    root_signature: ID3D12RootSignature,
    pipelines: LayerPipelines,
    overdraw: Option<OverdrawResources>,

    geometries: HashMap<String, MeshGeometry>,

    context: Dx12Context,
}

fn tex_vertices(mesh: &MeshData) -> Vec<TexVertex> {
    mesh.vertices.iter().map(TexVertex::from).collect()
}

fn upload_mesh(
    device: &ID3D12Device,
    command_list: &ID3D12GraphicsCommandList,
    name: &str,
    mesh: &MeshData,
) -> Result<MeshGeometry> {
    Ok(
        MeshGeometry::new(device, command_list, name, &tex_vertices(mesh), &mesh.indices16())?
            .with_submesh(name, SubmeshGeometry::whole(mesh)),
    )
}

impl BlendRenderer {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let context = Dx12Context::new(event_loop, config)?;
        let device = context.device.clone();
        let scene = BlendScene::new(context.width, context.height);

        context.reset_command_list(None)?;

        // 纹理：草地、水、铁丝网，然后是 60 帧闪电，最后一个槽位留给重绘纹理
        let srv_heap = Dx12DescriptorHeap::new(
            &device,
            D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            SRV_HEAP_SIZE as u32,
            true,
            "Blend SRV Heap",
        )?;
        let asset_dir = Path::new(&config.demo.asset_dir);
        let texture_paths = BLEND_TEXTURES
            .iter()
            .map(|file| asset_dir.join(file))
            .chain(bolt_frame_paths(asset_dir));

        let mut textures = Vec::with_capacity(OVERDRAW_SRV_INDEX);
        for (index, path) in texture_paths.enumerate() {
            let data = TextureData::load_or_fallback(&path);
            let texture = Dx12Texture::upload(&device, &context.command_list, &data)?;
            create_texture_srv(&device, &texture.resource, texture.format, srv_heap.cpu_handle(index));
            textures.push(texture);
        }
        engine_debug!(
            textures = textures.len(),
            bolt_offset = BOLT_SRV_OFFSET,
            "Blend textures uploaded"
        );

        let texture_range = [descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_SRV, 1, 0)];
        let root_signature = serialize_root_signature(
            &device,
            &[
                root_descriptor_table(&texture_range),
                root_cbv(0),
                root_cbv(1),
                root_cbv(2),
            ],
            &static_sampler_descs(),
        )?;
        let pipelines = LayerPipelines::create(&device, &root_signature, false)?;

        // 几何体
        let cmd = &context.command_list;
        let mut geometries = HashMap::new();
        geometries.insert("landGeo".to_string(), upload_mesh(&device, cmd, "landGeo", scene.land_mesh())?);
        geometries.insert("boxGeo".to_string(), upload_mesh(&device, cmd, "boxGeo", scene.box_mesh())?);
        geometries.insert("boltGeo".to_string(), upload_mesh(&device, cmd, "boltGeo", scene.bolt_mesh())?);

        // 水面的顶点缓冲每帧替换为帧资源里的动态缓冲
        let water_indices = scene.water_indices();
        let water_geo = MeshGeometry::new(&device, cmd, WATER_GEO, &scene.water_vertices(), &water_indices)?
            .with_submesh(WATER_GEO, SubmeshGeometry::new(water_indices.len() as u32, 0, 0));
        geometries.insert(WATER_GEO.to_string(), water_geo);

        let object_count = scene.items().len();
        let material_count = scene.materials().len();
        let wave_vertex_count = scene.waves().vertex_count();
        let frames = FrameResourceRing::new(|_| {
            FrameResource::new(&device, 1, object_count, material_count, wave_vertex_count)
        })?;

        context.execute_command_list()?;
        context.flush()?;

        let mut renderer = Self {
            scene,
            frames,
            srv_heap,
            textures,
            root_signature,
            pipelines,
            overdraw: None,
            geometries,
            context,
        };
        for geometry in renderer.geometries.values_mut() {
            geometry.dispose_uploaders();
        }
        for texture in &mut renderer.textures {
            texture.dispose_uploader();
        }

        engine_info!(
            width = renderer.context.width,
            height = renderer.context.height,
            wave_vertices = wave_vertex_count,
            "Blend demo initialized"
        );
        Ok(renderer)
    }

    /// 创建像素重绘模式需要的全部资源
    fn create_overdraw_resources(&mut self) -> Result<()> {
        let device = self.context.device.clone();

        let pipelines = LayerPipelines::create(&device, &self.root_signature, true)?;

        let quad_vs = compile_shader(&ShaderProgram::FULL_SCREEN_QUAD_VS)?;
        let quad_ps = compile_shader(&ShaderProgram::PIXEL_OVERDRAW_PS)?;
        let input_layout = tex_vertex_input_layout();
        let mut quad_desc = default_pso_desc(&self.root_signature, &input_layout, &quad_vs, &quad_ps);
        quad_desc.DepthStencilState.DepthFunc = D3D12_COMPARISON_FUNC_ALWAYS;
        let quad_pso = create_pso(&device, &quad_desc, "overdrawQuad")?;

        self.context.reset_command_list(None)?;
        let quad = GeometryGenerator::create_quad(-1.0, 1.0, 2.0, 2.0, 0.0);
        let mut quad_geo = MeshGeometry::new(
            &device,
            &self.context.command_list,
            "quadGeo",
            &tex_vertices(&quad),
            &quad.indices16(),
        )?
        .with_submesh(QUAD_SUBMESH, SubmeshGeometry::whole(&quad));
        self.context.execute_command_list()?;
        self.context.flush()?;
        quad_geo.dispose_uploaders();

        let texture = self.create_overdraw_texture()?;

        self.overdraw = Some(OverdrawResources {
            pipelines,
            quad_pso,
            quad_geo,
            texture,
        });
        engine_info!("Pixel overdraw resources created");
        Ok(())
    }

    /// 与客户区同尺寸的 R8_UINT 纹理，并在重绘槽位创建 SRV
    fn create_overdraw_texture(&self) -> Result<ID3D12Resource> {
        let (width, height) = self.context.size();
        let texture = create_texture_2d(
            &self.context.device,
            width,
            height,
            DXGI_FORMAT_R8_UINT,
            D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
        )?;
        create_texture_srv(
            &self.context.device,
            &texture,
            DXGI_FORMAT_R8_UINT,
            self.srv_heap.cpu_handle(OVERDRAW_SRV_INDEX),
        );
        engine_debug!(width, height, "Overdraw texture created");
        Ok(texture)
    }

    fn geometry(&self, name: &str) -> Result<&MeshGeometry> {
        self.geometries
            .get(name)
            .ok_or_else(|| DemoError::Runtime(format!("Unknown geometry '{}'", name)))
    }

    /// 画一个渲染层里的所有渲染项
    fn draw_layer(&self, layer: RenderLayer) -> Result<()> {
        let frame = self.frames.current();
        for &index in self.scene.layers().items(layer) {
            let item = &self.scene.items()[index];
            let material = self
                .scene
                .material(&item.material)
                .ok_or_else(|| DemoError::Runtime(format!("Unknown material '{}'", item.material)))?;
            let geometry = self.geometry(&item.geometry)?;

            draw_render_item(&self.context.command_list, geometry, item, material, frame, &self.srv_heap)?;
        }
        Ok(())
    }

    /// 把模板计数拷贝到重绘纹理，再画全屏四边形
    fn draw_overdraw_quad(&self, overdraw: &OverdrawResources) -> Result<()> {
        let ctx = &self.context;
        let depth_stencil = ctx.depth_stencil_buffer()?;
        let cmd = &ctx.command_list;

        unsafe {
            cmd.ResourceBarrier(&[
                transition_barrier(
                    depth_stencil,
                    D3D12_RESOURCE_STATE_DEPTH_WRITE,
                    D3D12_RESOURCE_STATE_COPY_SOURCE,
                    D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                ),
                transition_barrier(
                    &overdraw.texture,
                    D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                    D3D12_RESOURCE_STATE_COPY_DEST,
                    D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                ),
            ]);

            // 模板平面是子资源 1
            let src = D3D12_TEXTURE_COPY_LOCATION {
                pResource: std::mem::transmute_copy(depth_stencil),
                Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 { SubresourceIndex: 1 },
            };
            let dst = D3D12_TEXTURE_COPY_LOCATION {
                pResource: std::mem::transmute_copy(&overdraw.texture),
                Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 { SubresourceIndex: 0 },
            };
            cmd.CopyTextureRegion(&dst, 0, 0, 0, &src, None);

            cmd.ResourceBarrier(&[
                transition_barrier(
                    depth_stencil,
                    D3D12_RESOURCE_STATE_COPY_SOURCE,
                    D3D12_RESOURCE_STATE_DEPTH_WRITE,
                    D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                ),
                transition_barrier(
                    &overdraw.texture,
                    D3D12_RESOURCE_STATE_COPY_DEST,
                    D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                    D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
                ),
            ]);

            let submesh = overdraw
                .quad_geo
                .draw_args
                .get(QUAD_SUBMESH)
                .copied()
                .ok_or_else(|| DemoError::Runtime("Quad submesh missing".to_string()))?;

            cmd.SetPipelineState(&overdraw.quad_pso);
            cmd.IASetVertexBuffers(0, Some(&[overdraw.quad_geo.vertex_buffer_view()]));
            cmd.IASetIndexBuffer(Some(&overdraw.quad_geo.index_buffer_view()));
            cmd.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);
            cmd.SetGraphicsRootDescriptorTable(ROOT_SRV_TABLE, self.srv_heap.gpu_handle(OVERDRAW_SRV_INDEX)?);
            cmd.DrawIndexedInstanced(
                submesh.index_count,
                1,
                submesh.start_index_location,
                submesh.base_vertex_location,
                0,
            );
        }
        Ok(())
    }
}

impl RenderBackend for BlendRenderer {
    fn window(&self) -> &Window {
        self.context.window()
    }

    fn resize(&mut self) -> Result<()> {
        self.context.resize()?;
        self.scene.resize(self.context.width, self.context.height);

        // resize 已经刷新过队列，旧纹理可以直接替换
        if self.overdraw.is_some() {
            let texture = self.create_overdraw_texture()?;
            if let Some(overdraw) = self.overdraw.as_mut() {
                overdraw.texture = texture;
            }
        }
        Ok(())
    }

    fn update(&mut self, input_system: &mut InputSystem, timer: &GameTimer) -> Result<()> {
        self.scene.handle_input(input_system);
        self.scene.update(timer.total_time(), timer.delta_time());

        if self.scene.draw_mode() == DrawMode::PixelOverdraw && self.overdraw.is_none() {
            self.create_overdraw_resources()?;
        }

        self.frames.advance();
        if let Some(fence) = self.frames.fence_to_wait(self.context.completed_fence()) {
            engine_trace!(fence = fence.value(), "Waiting for frame resource");
            self.context.wait_for_fence(fence)?;
        }

        let pass = self.scene.pass_constants(self.context.size(), timer);
        let water_vertices = self.scene.water_vertices();

        let frame = self.frames.current_mut();
        frame.pass_cb.copy_data(0, &pass)?;

        let (items, materials) = self.scene.items_and_materials_mut();
        upload_dirty_constants(frame, items, materials)?;

        let waves_vb = frame
            .waves_vb
            .as_mut()
            .ok_or_else(|| DemoError::Runtime("Frame resource has no waves buffer".to_string()))?;
        waves_vb.copy_slice(&water_vertices)?;
        let waves_resource = waves_vb.resource().clone();

        if let Some(water_geo) = self.geometries.get_mut(WATER_GEO) {
            water_geo.vertex_buffer = waves_resource;
        }
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let ctx = &self.context;
        let frame = self.frames.current();
        ctx.reset_command_list_with(&frame.cmd_list_alloc, None)?;

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

            cmd.SetDescriptorHeaps(&[Some(self.srv_heap.heap().clone())]);
            cmd.SetGraphicsRootSignature(&self.root_signature);
            cmd.SetGraphicsRootConstantBufferView(ROOT_PASS_CBV, frame.pass_cb.gpu_address(0));
        }

        let overdraw = match self.scene.draw_mode() {
            DrawMode::Normal => None,
            DrawMode::PixelOverdraw => self.overdraw.as_ref(),
        };
        let pipelines = overdraw.map_or(&self.pipelines, |o| &o.pipelines);

        for layer in self.scene.draw_order() {
            unsafe {
                ctx.command_list.SetPipelineState(pipelines.get(layer));
            }
            self.draw_layer(layer)?;
        }

        if let Some(overdraw) = overdraw {
            self.draw_overdraw_quad(overdraw)?;
        }

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

impl Drop for BlendRenderer {
    fn drop(&mut self) {
        flush_on_drop(self.context.flush(), "blend");
    }
}
