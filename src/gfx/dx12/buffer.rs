//! GPU 缓冲区
//!
//! - [`UploadBuffer`]：常驻映射的上传堆缓冲，用于常量缓冲和每帧更新的顶点
//! - [`create_default_buffer`]：经由上传堆把静态数据拷贝到默认堆
//! - [`MeshGeometry`]：顶点/索引缓冲以及按名称索引的子网格

use std::collections::HashMap;
use std::marker::PhantomData;

use bytemuck::Pod;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::context::transition_barrier;
use super::creation_error;
use crate::core::error::{DemoError, GraphicsError, Result};
use crate::geometry::SubmeshGeometry;
use crate::renderer::resource::upload_element_byte_size;

fn buffer_desc(byte_size: u64) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
        Alignment: 0,
        Width: byte_size,
        Height: 1,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: DXGI_FORMAT_UNKNOWN,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

/// 在指定堆上创建缓冲资源
pub(crate) fn create_buffer(
    device: &ID3D12Device,
    heap_type: D3D12_HEAP_TYPE,
    byte_size: u64,
    initial_state: D3D12_RESOURCE_STATES,
) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: heap_type,
        ..Default::default()
    };
    let desc = buffer_desc(byte_size);

    let mut resource: Option<ID3D12Resource> = None;
    unsafe {
        device
            .CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &desc,
                initial_state,
                None,
                &mut resource,
            )
            .map_err(creation_error("Failed to create buffer"))?;
    }
    resource.ok_or_else(|| GraphicsError::ResourceCreation("Buffer is null".to_string()).into())
}

/// 常驻映射的上传缓冲
///
/// 作为常量缓冲时每个元素按 256 字节对齐。
pub struct UploadBuffer<T: Pod> {
    resource: ID3D12Resource,
    mapped: *mut u8,
    element_byte_size: usize,
    element_count: usize,
    _marker: PhantomData<T>,
}

impl<T: Pod> UploadBuffer<T> {
    pub fn new(device: &ID3D12Device, element_count: usize, is_constant_buffer: bool) -> Result<Self> {
        let element_byte_size = upload_element_byte_size(std::mem::size_of::<T>(), is_constant_buffer);
        let byte_size = (element_byte_size * element_count.max(1)) as u64;

        let resource = create_buffer(
            device,
            D3D12_HEAP_TYPE_UPLOAD,
            byte_size,
            D3D12_RESOURCE_STATE_GENERIC_READ,
        )?;

        // 上传堆的资源可以一直保持映射，只要 GPU 使用期间不写入
        let mut mapped = std::ptr::null_mut();
        unsafe {
            resource
                .Map(0, None, Some(&mut mapped))
                .map_err(creation_error("Failed to map upload buffer"))?;
        }

        Ok(Self {
            resource,
            mapped: mapped as *mut u8,
            element_byte_size,
            element_count,
            _marker: PhantomData,
        })
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub fn element_byte_size(&self) -> usize {
        self.element_byte_size
    }

    pub fn len(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    /// 写入第 `index` 个元素
    pub fn copy_data(&mut self, index: usize, data: &T) -> Result<()> {
        if index >= self.element_count {
            return Err(DemoError::Runtime(format!(
                "Upload buffer index {} out of range ({} elements)",
                index, self.element_count
            )));
        }

        let bytes = bytemuck::bytes_of(data);
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                self.mapped.add(index * self.element_byte_size),
                bytes.len(),
            );
        }
        Ok(())
    }

    /// 从第 0 个元素开始连续写入
    pub fn copy_slice(&mut self, data: &[T]) -> Result<()> {
        for (index, element) in data.iter().enumerate() {
            self.copy_data(index, element)?;
        }
        Ok(())
    }

    /// 第 `index` 个元素的 GPU 地址
    pub fn gpu_address(&self, index: usize) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() + (index * self.element_byte_size) as u64 }
    }
}

impl<T: Pod> Drop for UploadBuffer<T> {
    fn drop(&mut self) {
        unsafe {
            self.resource.Unmap(0, None);
        }
    }
}

/// 创建默认堆缓冲并记录从上传堆拷贝的命令
///
/// 返回 `(默认缓冲, 上传缓冲)`。上传缓冲必须保留到命令列表执行完毕。
pub fn create_default_buffer(
    device: &ID3D12Device,
    command_list: &ID3D12GraphicsCommandList,
    data: &[u8],
) -> Result<(ID3D12Resource, ID3D12Resource)> {
    let byte_size = data.len() as u64;

    let default_buffer = create_buffer(
        device,
        D3D12_HEAP_TYPE_DEFAULT,
        byte_size,
        D3D12_RESOURCE_STATE_COMMON,
    )?;
    let upload_buffer = create_buffer(
        device,
        D3D12_HEAP_TYPE_UPLOAD,
        byte_size,
        D3D12_RESOURCE_STATE_GENERIC_READ,
    )?;

    unsafe {
        let mut mapped = std::ptr::null_mut();
        upload_buffer
            .Map(0, None, Some(&mut mapped))
            .map_err(creation_error("Failed to map upload buffer"))?;
        std::ptr::copy_nonoverlapping(data.as_ptr(), mapped as *mut u8, data.len());
        upload_buffer.Unmap(0, None);

        command_list.ResourceBarrier(&[transition_barrier(
            &default_buffer,
            D3D12_RESOURCE_STATE_COMMON,
            D3D12_RESOURCE_STATE_COPY_DEST,
            D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
        )]);
        command_list.CopyBufferRegion(&default_buffer, 0, &upload_buffer, 0, byte_size);
        command_list.ResourceBarrier(&[transition_barrier(
            &default_buffer,
            D3D12_RESOURCE_STATE_COPY_DEST,
            D3D12_RESOURCE_STATE_GENERIC_READ,
            D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
        )]);
    }

    Ok((default_buffer, upload_buffer))
}

/// 一组顶点缓冲与索引缓冲
pub struct MeshGeometry {
    pub name: String,

    pub vertex_buffer: ID3D12Resource,
    pub index_buffer: ID3D12Resource,

    vertex_uploader: Option<ID3D12Resource>,
    index_uploader: Option<ID3D12Resource>,

    pub vertex_byte_stride: u32,
    pub vertex_buffer_byte_size: u32,
    pub index_format: DXGI_FORMAT,
    pub index_buffer_byte_size: u32,

    /// 子网格，按名称索引
    pub draw_args: HashMap<String, SubmeshGeometry>,
}

impl MeshGeometry {
    /// 上传顶点和 16 位索引
    pub fn new<V: Pod>(
        device: &ID3D12Device,
        command_list: &ID3D12GraphicsCommandList,
        name: impl Into<String>,
        vertices: &[V],
        indices: &[u16],
    ) -> Result<Self> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(indices);

        let (vertex_buffer, vertex_uploader) = create_default_buffer(device, command_list, vertex_bytes)?;
        let (index_buffer, index_uploader) = create_default_buffer(device, command_list, index_bytes)?;

        Ok(Self {
            name: name.into(),
            vertex_buffer,
            index_buffer,
            vertex_uploader: Some(vertex_uploader),
            index_uploader: Some(index_uploader),
            vertex_byte_stride: std::mem::size_of::<V>() as u32,
            vertex_buffer_byte_size: vertex_bytes.len() as u32,
            index_format: DXGI_FORMAT_R16_UINT,
            index_buffer_byte_size: index_bytes.len() as u32,
            draw_args: HashMap::new(),
        })
    }

    pub fn with_submesh(mut self, name: impl Into<String>, submesh: SubmeshGeometry) -> Self {
        self.draw_args.insert(name.into(), submesh);
        self
    }

    pub fn vertex_buffer_view(&self) -> D3D12_VERTEX_BUFFER_VIEW {
        D3D12_VERTEX_BUFFER_VIEW {
            BufferLocation: unsafe { self.vertex_buffer.GetGPUVirtualAddress() },
            SizeInBytes: self.vertex_buffer_byte_size,
            StrideInBytes: self.vertex_byte_stride,
        }
    }

    pub fn index_buffer_view(&self) -> D3D12_INDEX_BUFFER_VIEW {
        D3D12_INDEX_BUFFER_VIEW {
            BufferLocation: unsafe { self.index_buffer.GetGPUVirtualAddress() },
            SizeInBytes: self.index_buffer_byte_size,
            Format: self.index_format,
        }
    }

    /// 拷贝命令执行完后可以释放上传缓冲
    pub fn dispose_uploaders(&mut self) {
        self.vertex_uploader = None;
        self.index_uploader = None;
    }
}
