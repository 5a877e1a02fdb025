//! 方块示例渲染器
//!
//! 一个描述符表（两个 CBV），两个顶点流（位置 / 颜色），36 个索引。
//! 没有帧资源环：每帧结束都会刷新命令队列。

use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use winit::event_loop::EventLoop;
use winit::window::Window;

use super::buffer::{create_default_buffer, MeshGeometry, UploadBuffer};
use super::context::Dx12Context;
use super::descriptor::Dx12DescriptorHeap;
use super::pipeline::{
    box_input_layout, compile_shader, create_pso, default_pso_desc, descriptor_range,
    root_descriptor_table, serialize_root_signature,
};
use crate::core::error::{DemoError, Result};
use crate::core::{Config, GameTimer, InputSystem};
use crate::demos::BoxScene;
use crate::geometry::SubmeshGeometry;
use crate::renderer::{BoxGlobalConstants, BoxObjectConstants, RenderBackend, ShaderProgram};
use crate::{engine_info, engine_trace};

/// 方块示例渲染器
pub struct BoxRenderer {
    scene: BoxScene,

    cbv_heap: Dx12DescriptorHeap,
    object_cb: UploadBuffer<BoxObjectConstants>,
    global_cb: UploadBuffer<BoxGlobalConstants>,

    root_signature: ID3D12RootSignature,
    pso: ID3D12PipelineState,

    /// 位置流与索引
    box_geo: MeshGeometry,
    /// 颜色流
    color_buffer: ID3D12Resource,
    color_buffer_byte_size: u32,

    // 最后释放，Drop 时会先刷新队列
    context: Dx12Context,
}

impl BoxRenderer {
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let context = Dx12Context::new(event_loop, config)?;
        let device = context.device.clone();
        let scene = BoxScene::new(context.width, context.height);

        context.reset_command_list(None)?;

        // b0: 物体常量，b1: 全局常量
        let cbv_heap = Dx12DescriptorHeap::new(
            &device,
            D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV,
            2,
            true,
            "Box CBV Heap",
        )?;
        let object_cb = UploadBuffer::<BoxObjectConstants>::new(&device, 1, true)?;
        let global_cb = UploadBuffer::<BoxGlobalConstants>::new(&device, 1, true)?;
        unsafe {
            device.CreateConstantBufferView(
                Some(&D3D12_CONSTANT_BUFFER_VIEW_DESC {
                    BufferLocation: object_cb.gpu_address(0),
                    SizeInBytes: object_cb.element_byte_size() as u32,
                }),
                cbv_heap.cpu_handle(0),
            );
            device.CreateConstantBufferView(
                Some(&D3D12_CONSTANT_BUFFER_VIEW_DESC {
                    BufferLocation: global_cb.gpu_address(0),
                    SizeInBytes: global_cb.element_byte_size() as u32,
                }),
                cbv_heap.cpu_handle(1),
            );
        }

        let cbv_table = [descriptor_range(D3D12_DESCRIPTOR_RANGE_TYPE_CBV, 2, 0)];
        let root_signature =
            serialize_root_signature(&device, &[root_descriptor_table(&cbv_table)], &[])?;

        let vs = compile_shader(&ShaderProgram::BOX_VS)?;
        let ps = compile_shader(&ShaderProgram::BOX_PS)?;
        let input_layout = box_input_layout();
        let pso_desc = default_pso_desc(&root_signature, &input_layout, &vs, &ps);
        let pso = create_pso(&device, &pso_desc, "box")?;

        let box_geo = MeshGeometry::new(
            &device,
            &context.command_list,
            "boxGeo",
            scene.positions(),
            scene.indices(),
        )?
        .with_submesh("box", SubmeshGeometry::new(scene.indices().len() as u32, 0, 0));

        let colors = scene.colors();
        let color_bytes: &[u8] = bytemuck::cast_slice(&colors);
        let (color_buffer, _color_uploader) =
            create_default_buffer(&device, &context.command_list, color_bytes)?;

        context.execute_command_list()?;
        context.flush()?;

        let mut renderer = Self {
            scene,
            cbv_heap,
            object_cb,
            global_cb,
            root_signature,
            pso,
            box_geo,
            color_buffer,
            color_buffer_byte_size: color_bytes.len() as u32,
            context,
        };
        renderer.box_geo.dispose_uploaders();

        engine_info!(
            width = renderer.context.width,
            height = renderer.context.height,
            "Box demo initialized"
        );
        Ok(renderer)
    }

    fn color_buffer_view(&self) -> D3D12_VERTEX_BUFFER_VIEW {
        D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: unsafe { self.color_buffer.GetGPUVirtualAddress() },
            SizeInBytes: self.color_buffer_byte_size,
            StrideInBytes: std::mem::size_of::<[f32; 4]>() as u32,
        }
    }
}

impl RenderBackend for BoxRenderer {
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

        let total_time = timer.total_time();
        self.object_cb.copy_data(0, &self.scene.object_constants(total_time))?;
        self.global_cb.copy_data(0, &self.scene.global_constants(total_time))?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let ctx = &self.context;
        ctx.reset_command_list(Some(&self.pso))?;

        let back_buffer = ctx.current_back_buffer()?.clone();
        let rtv = ctx.current_back_buffer_view();
        let dsv = ctx.depth_stencil_view();
        let submesh = self
            .box_geo
            .draw_args
            .get("box")
            .copied()
            .ok_or_else(|| DemoError::Runtime("Box submesh missing".to_string()))?;

        unsafe {
            let cmd = &ctx.command_list;
            cmd.RSSetViewports(&[ctx.viewport]);
            cmd.RSSetScissorRects(&[ctx.scissor_rect]);

            ctx.transition(&back_buffer, D3D12_RESOURCE_STATE_PRESENT, D3D12_RESOURCE_STATE_RENDER_TARGET);

            cmd.ClearRenderTargetView(rtv, &self.scene.clear_color().to_array(), None);
            cmd.ClearDepthStencilView(dsv, D3D12_CLEAR_FLAG_DEPTH | D3D12_CLEAR_FLAG_STENCIL, 1.0, 0, None);
            cmd.OMSetRenderTargets(1, Some(&rtv), true, Some(&dsv));

            cmd.SetDescriptorHeaps(&[Some(self.cbv_heap.heap().clone())]);
            cmd.SetGraphicsRootSignature(&self.root_signature);

            cmd.IASetVertexBuffers(0, Some(&[self.box_geo.vertex_buffer_view(), self.color_buffer_view()]));
            cmd.IASetIndexBuffer(Some(&self.box_geo.index_buffer_view()));
            cmd.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);

            cmd.SetGraphicsRootDescriptorTable(0, self.cbv_heap.gpu_handle(0)?);
            cmd.DrawIndexedInstanced(
                submesh.index_count,
                1,
                submesh.start_index_location,
                submesh.base_vertex_location,
                0,
            );

            ctx.transition(&back_buffer, D3D12_RESOURCE_STATE_RENDER_TARGET, D3D12_RESOURCE_STATE_PRESENT);
        }
        drop(back_buffer);

        self.context.execute_command_list()?;
        self.context.present()?;

        // 没有帧资源环，等 GPU 做完再开始下一帧
        self.context.flush()?;
        engine_trace!(fence = self.context.fence_manager.current_value().value(), "Box frame presented");
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "DirectX 12"
    }
}

