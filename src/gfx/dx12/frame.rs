//! 帧资源
//!
//! CPU 每帧都要写的东西各准备一份：命令分配器、三个常量缓冲，
//! 混合示例还有水面的动态顶点缓冲。环形队列与围栏逻辑在
//! [`crate::renderer::FrameResourceRing`] 中。
//!
//! 另有两个箱子和混合示例共用的函数：上传脏常量、绘制单个渲染项。

use windows::Win32::Graphics::Direct3D::D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST;
use windows::Win32::Graphics::Direct3D12::*;

use super::buffer::{MeshGeometry, UploadBuffer};
use super::creation_error;
use super::descriptor::Dx12DescriptorHeap;
use super::pipeline::{ROOT_MATERIAL_CBV, ROOT_OBJECT_CBV, ROOT_SRV_TABLE};
use crate::core::error::Result;
use crate::geometry::TexVertex;
use crate::renderer::{
    Material, MaterialConstants, ObjectConstants, PassConstants, RenderItem,
};

/// 一帧的 GPU 资源
pub struct FrameResource {
    pub cmd_list_alloc: ID3D12CommandAllocator,
    pub pass_cb: UploadBuffer<PassConstants>,
    pub object_cb: UploadBuffer<ObjectConstants>,
    pub material_cb: UploadBuffer<MaterialConstants>,
    /// 水面顶点，只有混合示例使用
    pub waves_vb: Option<UploadBuffer<TexVertex>>,
}

impl FrameResource {
    pub fn new(
        device: &ID3D12Device,
        pass_count: usize,
        object_count: usize,
        material_count: usize,
        wave_vertex_count: usize,
    ) -> Result<Self> {
        let cmd_list_alloc: ID3D12CommandAllocator = unsafe {
            device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(creation_error("Failed to create frame command allocator"))?
        };

        let waves_vb = if wave_vertex_count > 0 {
            Some(UploadBuffer::new(device, wave_vertex_count, false)?)
        } else {
            None
        };

        Ok(Self {
            cmd_list_alloc,
            pass_cb: UploadBuffer::new(device, pass_count, true)?,
            object_cb: UploadBuffer::new(device, object_count, true)?,
            material_cb: UploadBuffer::new(device, material_count, true)?,
            waves_vb,
        })
    }
}

/// 绘制一个渲染项
///
/// 根签名、PSO 和描述符堆由调用方设置。纹理表指向材质的 SRV，
/// 物体与材质常量取自 `frame` 中对应的槽位。
pub fn draw_render_item(
    command_list: &ID3D12GraphicsCommandList,
    geometry: &MeshGeometry,
    item: &RenderItem,
    material: &Material,
    frame: &FrameResource,
    srv_heap: &Dx12DescriptorHeap,
) -> Result<()> {
    let texture = srv_heap.gpu_handle(material.diffuse_srv_heap_index)?;
    unsafe {
        command_list.IASetVertexBuffers(0, Some(&[geometry.vertex_buffer_view()]));
        command_list.IASetIndexBuffer(Some(&geometry.index_buffer_view()));
        command_list.IASetPrimitiveTopology(D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST);

        command_list.SetGraphicsRootDescriptorTable(ROOT_SRV_TABLE, texture);
        command_list.SetGraphicsRootConstantBufferView(
            ROOT_OBJECT_CBV,
            frame.object_cb.gpu_address(item.obj_cb_index),
        );
        command_list.SetGraphicsRootConstantBufferView(
            ROOT_MATERIAL_CBV,
            frame.material_cb.gpu_address(material.mat_cb_index),
        );

        command_list.DrawIndexedInstanced(
            item.index_count,
            1,
            item.start_index_location,
            item.base_vertex_location,
            0,
        );
    }
    Ok(())
}

/// 把脏的物体常量和材质常量写入 `frame`
pub fn upload_dirty_constants(
    frame: &mut FrameResource,
    items: &mut [RenderItem],
    materials: &mut [Material],
) -> Result<()> {
    for item in items.iter_mut() {
        if item.take_dirty() {
            frame.object_cb.copy_data(item.obj_cb_index, &item.constants())?;
        }
    }
    for material in materials.iter_mut() {
        if material.take_dirty() {
            frame.material_cb.copy_data(material.mat_cb_index, &material.constants())?;
        }
    }
    Ok(())
}
