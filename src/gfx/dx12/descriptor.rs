//! DirectX 12 描述符堆
//!
//! 对 `ID3D12DescriptorHeap` 的薄封装：记录增量大小，
//! 按索引计算 CPU / GPU 句柄。

use windows::Win32::Graphics::Direct3D12::*;

use crate::core::error::{GraphicsError, Result};

/// 描述符堆
pub struct Dx12DescriptorHeap {
    heap: ID3D12DescriptorHeap,
    heap_type: D3D12_DESCRIPTOR_HEAP_TYPE,
    increment_size: u32,
    num_descriptors: u32,
    shader_visible: bool,
}

impl Dx12DescriptorHeap {
    /// 创建描述符堆
    ///
    /// RTV / DSV 堆不能对着色器可见，`shader_visible` 只对 CBV/SRV/UAV 和采样器堆有效。
    pub fn new(
        device: &ID3D12Device,
        heap_type: D3D12_DESCRIPTOR_HEAP_TYPE,
        num_descriptors: u32,
        shader_visible: bool,
        name: &str,
    ) -> Result<Self> {
        let flags = if shader_visible {
            D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
        } else {
            D3D12_DESCRIPTOR_HEAP_FLAG_NONE
        };

        let heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
            Type: heap_type,
            NumDescriptors: num_descriptors,
            Flags: flags,
            NodeMask: 0,
        };

        unsafe {
            let heap: ID3D12DescriptorHeap = device.CreateDescriptorHeap(&heap_desc).map_err(|e| {
                GraphicsError::ResourceCreation(format!(
                    "Failed to create {} descriptor heap: {:?}",
                    name, e
                ))
            })?;

            let wide_name: Vec<u16> = name.encode_utf16().chain(Some(0)).collect();
            let _ = heap.SetName(windows::core::PCWSTR(wide_name.as_ptr()));

            let increment_size = device.GetDescriptorHandleIncrementSize(heap_type);

            Ok(Self {
                heap,
                heap_type,
                increment_size,
                num_descriptors,
                shader_visible,
            })
        }
    }

    pub fn heap(&self) -> &ID3D12DescriptorHeap {
        &self.heap
    }

    pub fn heap_type(&self) -> D3D12_DESCRIPTOR_HEAP_TYPE {
        self.heap_type
    }

    pub fn increment_size(&self) -> u32 {
        self.increment_size
    }

    pub fn len(&self) -> u32 {
        self.num_descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.num_descriptors == 0
    }

    /// 第 `index` 个描述符的 CPU 句柄
    pub fn cpu_handle(&self, index: usize) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        debug_assert!(index < self.num_descriptors as usize);
        let start = unsafe { self.heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + index * self.increment_size as usize,
        }
    }

    /// 第 `index` 个描述符的 GPU 句柄，只有着色器可见的堆才有
    pub fn gpu_handle(&self, index: usize) -> Result<D3D12_GPU_DESCRIPTOR_HANDLE> {
        if !self.shader_visible {
            return Err(GraphicsError::ResourceCreation(
                "GPU handle requested from a heap that is not shader visible".to_string(),
            )
            .into());
        }
        debug_assert!(index < self.num_descriptors as usize);
        let start = unsafe { self.heap.GetGPUDescriptorHandleForHeapStart() };
        Ok(D3D12_GPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + (index as u64) * self.increment_size as u64,
        })
    }
}
