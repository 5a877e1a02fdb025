//! 纹理资源
//!
//! 把 [`TextureData`] 上传到默认堆，并创建 SRV。
//! 只有一个 mip 层级，行距按 `GetCopyableFootprints` 返回的 256 字节对齐。

use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use super::buffer::create_buffer;
use super::context::transition_barrier;
use super::creation_error;
use crate::core::error::{GraphicsError, Result, TextureError};
use crate::engine_debug;
use crate::renderer::TextureData;

/// 单个 mip 的二维纹理描述
fn texture_2d_desc(width: u32, height: u32, format: DXGI_FORMAT) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: width as u64,
        Height: height,
        DepthOrArraySize: 1,
        MipLevels: 1,
        Format: format,
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: 1,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: D3D12_RESOURCE_FLAG_NONE,
    }
}

/// 在默认堆上创建二维纹理
pub fn create_texture_2d(
    device: &ID3D12Device,
    width: u32,
    height: u32,
    format: DXGI_FORMAT,
    initial_state: D3D12_RESOURCE_STATES,
) -> Result<ID3D12Resource> {
    let heap_props = D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE_DEFAULT,
        ..Default::default()
    };
    let desc = texture_2d_desc(width, height, format);

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
            .map_err(creation_error("Failed to create texture"))?;
    }
    resource.ok_or_else(|| GraphicsError::ResourceCreation("Texture is null".to_string()).into())
}

/// GPU 纹理
pub struct Dx12Texture {
    pub name: String,
    pub resource: ID3D12Resource,
    pub format: DXGI_FORMAT,
    upload_heap: Option<ID3D12Resource>,
}

impl Dx12Texture {
    /// 记录上传命令，结束时纹理处于 PIXEL_SHADER_RESOURCE 状态
    ///
    /// 上传堆保留到 [`Dx12Texture::dispose_uploader`]，调用前命令列表必须执行完。
    pub fn upload(
        device: &ID3D12Device,
        command_list: &ID3D12GraphicsCommandList,
        data: &TextureData,
    ) -> Result<Self> {
        if !data.is_consistent() {
            return Err(TextureError::Decode {
                path: data.name.clone().into(),
                reason: format!("{}x{} does not match {} bytes", data.width, data.height, data.rgba8.len()),
            }
            .into());
        }

        let format = DXGI_FORMAT_R8G8B8A8_UNORM;
        let resource = create_texture_2d(
            device,
            data.width,
            data.height,
            format,
            D3D12_RESOURCE_STATE_COPY_DEST,
        )?;

        let desc = texture_2d_desc(data.width, data.height, format);
        let mut footprint = D3D12_PLACED_SUBRESOURCE_FOOTPRINT::default();
        let mut num_rows = 0u32;
        let mut row_size = 0u64;
        let mut total_bytes = 0u64;
        unsafe {
            device.GetCopyableFootprints(
                &desc,
                0,
                1,
                0,
                Some(&mut footprint as *mut _),
                Some(&mut num_rows as *mut _),
                Some(&mut row_size as *mut _),
                Some(&mut total_bytes as *mut _),
            );
        }

        let upload_heap = create_buffer(
            device,
            D3D12_HEAP_TYPE_UPLOAD,
            total_bytes,
            D3D12_RESOURCE_STATE_GENERIC_READ,
        )?;

        unsafe {
            let mut mapped = std::ptr::null_mut();
            upload_heap
                .Map(0, None, Some(&mut mapped))
                .map_err(creation_error("Failed to map texture upload heap"))?;

            let dst = (mapped as *mut u8).add(footprint.Offset as usize);
            let src_pitch = data.row_pitch();
            let dst_pitch = footprint.Footprint.RowPitch as usize;
            for row in 0..num_rows as usize {
                std::ptr::copy_nonoverlapping(
                    data.rgba8.as_ptr().add(row * src_pitch),
                    dst.add(row * dst_pitch),
                    src_pitch,
                );
            }
            upload_heap.Unmap(0, None);

            let dst_location = D3D12_TEXTURE_COPY_LOCATION {
                pResource: std::mem::transmute_copy(&resource),
                Type: D3D12_TEXTURE_COPY_TYPE_SUBRESOURCE_INDEX,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                    SubresourceIndex: 0,
                },
            };
            let src_location = D3D12_TEXTURE_COPY_LOCATION {
                pResource: std::mem::transmute_copy(&upload_heap),
                Type: D3D12_TEXTURE_COPY_TYPE_PLACED_FOOTPRINT,
                Anonymous: D3D12_TEXTURE_COPY_LOCATION_0 {
                    PlacedFootprint: footprint,
                },
            };
            command_list.CopyTextureRegion(&dst_location, 0, 0, 0, &src_location, None);
            command_list.ResourceBarrier(&[transition_barrier(
                &resource,
                D3D12_RESOURCE_STATE_COPY_DEST,
                D3D12_RESOURCE_STATE_PIXEL_SHADER_RESOURCE,
                D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            )]);
        }

        engine_debug!(
            texture = %data.name,
            width = data.width,
            height = data.height,
            upload_bytes = total_bytes,
            "Texture upload recorded"
        );

        Ok(Self {
            name: data.name.clone(),
            resource,
            format,
            upload_heap: Some(upload_heap),
        })
    }

    pub fn dispose_uploader(&mut self) {
        self.upload_heap = None;
    }
}

/// 在 `handle` 处创建二维纹理的 SRV
pub fn create_texture_srv(
    device: &ID3D12Device,
    resource: &ID3D12Resource,
    format: DXGI_FORMAT,
    handle: D3D12_CPU_DESCRIPTOR_HANDLE,
) {
    let desc = D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: format,
        ViewDimension: D3D12_SRV_DIMENSION_TEXTURE2D,
        Shader4ComponentMapping: D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING,
        Anonymous: D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
            Texture2D: D3D12_TEX2D_SRV {
                MostDetailedMip: 0,
                MipLevels: 1,
                PlaneSlice: 0,
                ResourceMinLODClamp: 0.0,
            },
        },
    };
    unsafe {
        device.CreateShaderResourceView(resource, Some(&desc), handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_desc() {
        let desc = texture_2d_desc(640, 480, DXGI_FORMAT_R8_UINT);
        assert_eq!(desc.Width, 640);
        assert_eq!(desc.Height, 480);
        assert_eq!(desc.MipLevels, 1);
        assert_eq!(desc.Format, DXGI_FORMAT_R8_UINT);
        assert_eq!(desc.Dimension, D3D12_RESOURCE_DIMENSION_TEXTURE2D);
    }
}
