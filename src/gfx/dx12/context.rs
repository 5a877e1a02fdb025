//! DirectX 12 设备上下文
//!
//! 三个示例共用的基础设施：窗口、设备、命令队列、交换链、
//! RTV/DSV 堆、深度模板缓冲和围栏。
//!
//! # 初始化流程
//!
//! 1. 创建窗口
//! 2. 启用调试层（Debug 模式）
//! 3. 创建 DXGI 工厂和 D3D12 设备（失败时退回 WARP）
//! 4. 创建围栏、命令队列、命令分配器和命令列表
//! 5. 创建交换链和描述符堆
//! 6. 按窗口大小创建渲染目标视图和深度模板缓冲

use std::mem::ManuallyDrop;
use std::sync::Arc;

use windows::core::Interface;
use windows::Win32::Foundation::{CloseHandle, HANDLE, HWND, RECT};
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;
use windows::Win32::Graphics::Dxgi::*;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoop;
use winit::raw_window_handle::{HasWindowHandle, RawWindowHandle};
use winit::window::{Window, WindowBuilder};

use super::descriptor::Dx12DescriptorHeap;
use super::{command_error, creation_error};
use crate::core::error::{DemoError, GraphicsError, Result};
use crate::core::Config;
use crate::renderer::{FenceManager, FenceValue};
use crate::{engine_debug, engine_info, engine_warn};

/// 交换链缓冲数量
pub const SWAP_CHAIN_BUFFER_COUNT: usize = 2;

/// 后台缓冲格式
pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

/// 深度模板格式，模板位于子资源 1
pub const DEPTH_STENCIL_FORMAT: DXGI_FORMAT = DXGI_FORMAT_D24_UNORM_S8_UINT;

/// 资源状态转换屏障
///
/// 不增加资源的引用计数，屏障只在录制命令期间使用。
pub fn transition_barrier(
    resource: &ID3D12Resource,
    before: D3D12_RESOURCE_STATES,
    after: D3D12_RESOURCE_STATES,
    subresource: u32,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: unsafe { std::mem::transmute_copy(resource) },
                Subresource: subresource,
                StateBefore: before,
                StateAfter: after,
            }),
        },
    }
}

/// DirectX 12 设备上下文
pub struct Dx12Context {
    pub window: Arc<Window>,

    pub factory: IDXGIFactory4,
    pub device: ID3D12Device,
    pub command_queue: ID3D12CommandQueue,

    /// 初始化、改变大小和方块示例使用的命令分配器
    pub direct_cmd_list_alloc: ID3D12CommandAllocator,
    pub command_list: ID3D12GraphicsCommandList,

    pub swap_chain: IDXGISwapChain3,
    swap_chain_buffers: Vec<ID3D12Resource>,
    current_back_buffer: usize,

    pub rtv_heap: Dx12DescriptorHeap,
    pub dsv_heap: Dx12DescriptorHeap,
    depth_stencil_buffer: Option<ID3D12Resource>,

    pub viewport: D3D12_VIEWPORT,
    pub scissor_rect: RECT,

    pub fence: ID3D12Fence,
    pub fence_manager: FenceManager,
    fence_event: HANDLE,

    /// CBV/SRV/UAV 描述符增量
    pub cbv_srv_uav_descriptor_size: u32,

    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Dx12Context {
    /// 创建窗口并初始化 Direct3D 12
    pub fn new(event_loop: &EventLoop<()>, config: &Config) -> Result<Self> {
        let width = config.window.width;
        let height = config.window.height;

        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.window.title.clone())
                .with_inner_size(LogicalSize::new(width, height))
                .with_resizable(config.window.resizable)
                .build(event_loop)
                .map_err(|e| DemoError::Initialization(format!("Failed to create window: {}", e)))?,
        );

        unsafe {
            #[cfg(debug_assertions)]
            {
                let mut debug: Option<ID3D12Debug> = None;
                match D3D12GetDebugInterface(&mut debug) {
                    Ok(()) => {
                        if let Some(debug) = debug {
                            debug.EnableDebugLayer();
                            engine_debug!("DX12 debug layer enabled");
                        }
                    }
                    Err(e) => engine_warn!(error = ?e, "Failed to enable DX12 debug layer"),
                }
            }

            let factory_flags = if cfg!(debug_assertions) {
                DXGI_CREATE_FACTORY_DEBUG
            } else {
                DXGI_CREATE_FACTORY_FLAGS(0)
            };
            let factory: IDXGIFactory4 = CreateDXGIFactory2(factory_flags)
                .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create DXGI factory: {:?}", e)))?;

            let device = create_device(&factory)?;

            let fence: ID3D12Fence = device
                .CreateFence(0, D3D12_FENCE_FLAG_NONE)
                .map_err(creation_error("Failed to create fence"))?;
            let fence_event = CreateEventA(None, false, false, None)
                .map_err(creation_error("Failed to create fence event"))?;

            let cbv_srv_uav_descriptor_size =
                device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV);

            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue = device
                .CreateCommandQueue(&queue_desc)
                .map_err(creation_error("Failed to create command queue"))?;

            let direct_cmd_list_alloc: ID3D12CommandAllocator = device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(creation_error("Failed to create command allocator"))?;

            let command_list: ID3D12GraphicsCommandList = device
                .CreateCommandList(
                    0,
                    D3D12_COMMAND_LIST_TYPE_DIRECT,
                    &direct_cmd_list_alloc,
                    None::<&ID3D12PipelineState>,
                )
                .map_err(creation_error("Failed to create command list"))?;

            // 第一次 Reset 之前命令列表必须是关闭状态
            command_list.Close().map_err(command_error("Failed to close command list"))?;

            let hwnd = window_hwnd(&window)?;
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: BACK_BUFFER_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: SWAP_CHAIN_BUFFER_COUNT as u32,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                Flags: DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH.0 as u32,
                ..Default::default()
            };
            let swap_chain: IDXGISwapChain1 = factory
                .CreateSwapChainForHwnd(&command_queue, hwnd, &swap_chain_desc, None, None)
                .map_err(|e| GraphicsError::SwapchainError(format!("Failed to create swap chain: {:?}", e)))?;
            let swap_chain: IDXGISwapChain3 = swap_chain
                .cast()
                .map_err(|e| GraphicsError::SwapchainError(format!("IDXGISwapChain3 unavailable: {:?}", e)))?;

            let rtv_heap = Dx12DescriptorHeap::new(
                &device,
                D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                SWAP_CHAIN_BUFFER_COUNT as u32,
                false,
                "RTV",
            )?;
            let dsv_heap =
                Dx12DescriptorHeap::new(&device, D3D12_DESCRIPTOR_HEAP_TYPE_DSV, 1, false, "DSV")?;

            engine_info!(width, height, buffers = SWAP_CHAIN_BUFFER_COUNT, "Swap chain created");

            let mut context = Self {
                window,
                factory,
                device,
                command_queue,
                direct_cmd_list_alloc,
                command_list,
                swap_chain,
                swap_chain_buffers: Vec::with_capacity(SWAP_CHAIN_BUFFER_COUNT),
                current_back_buffer: 0,
                rtv_heap,
                dsv_heap,
                depth_stencil_buffer: None,
                viewport: D3D12_VIEWPORT::default(),
                scissor_rect: RECT::default(),
                fence,
                fence_manager: FenceManager::new(),
                fence_event,
                cbv_srv_uav_descriptor_size,
                width,
                height,
                vsync: config.graphics.vsync,
            };

            context.resize()?;
            engine_info!("DX12 context initialization complete");
            Ok(context)
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// 宽高比
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn current_back_buffer(&self) -> Result<&ID3D12Resource> {
        self.swap_chain_buffers
            .get(self.current_back_buffer)
            .ok_or_else(|| GraphicsError::SwapchainError("Back buffer not created".to_string()).into())
    }

    pub fn current_back_buffer_view(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.rtv_heap.cpu_handle(self.current_back_buffer)
    }

    pub fn depth_stencil_view(&self) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        self.dsv_heap.cpu_handle(0)
    }

    pub fn depth_stencil_buffer(&self) -> Result<&ID3D12Resource> {
        self.depth_stencil_buffer.as_ref().ok_or_else(|| {
            GraphicsError::ResourceCreation("Depth stencil buffer not created".to_string()).into()
        })
    }

    /// 在 `command_list` 上记录一次状态转换
    pub fn transition(
        &self,
        resource: &ID3D12Resource,
        before: D3D12_RESOURCE_STATES,
        after: D3D12_RESOURCE_STATES,
    ) {
        self.transition_subresource(resource, before, after, D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES);
    }

    pub fn transition_subresource(
        &self,
        resource: &ID3D12Resource,
        before: D3D12_RESOURCE_STATES,
        after: D3D12_RESOURCE_STATES,
        subresource: u32,
    ) {
        unsafe {
            self.command_list
                .ResourceBarrier(&[transition_barrier(resource, before, after, subresource)]);
        }
    }

    /// 用 `direct_cmd_list_alloc` 重新开始录制
    pub fn reset_command_list(&self, pso: Option<&ID3D12PipelineState>) -> Result<()> {
        self.reset_command_list_with(&self.direct_cmd_list_alloc, pso)
    }

    /// 用指定的分配器重新开始录制
    ///
    /// 分配器里的命令必须已经执行完。
    pub fn reset_command_list_with(
        &self,
        allocator: &ID3D12CommandAllocator,
        pso: Option<&ID3D12PipelineState>,
    ) -> Result<()> {
        unsafe {
            allocator
                .Reset()
                .map_err(command_error("Failed to reset command allocator"))?;
            self.command_list
                .Reset(allocator, pso)
                .map_err(command_error("Failed to reset command list"))?;
        }
        Ok(())
    }

    /// 关闭命令列表并提交到队列
    pub fn execute_command_list(&self) -> Result<()> {
        unsafe {
            self.command_list
                .Close()
                .map_err(command_error("Failed to close command list"))?;
            let lists = [Some(self.command_list.cast::<ID3D12CommandList>().map_err(
                command_error("Failed to cast command list"),
            )?)];
            self.command_queue.ExecuteCommandLists(&lists);
        }
        Ok(())
    }

    /// 在队列中插入新的围栏值
    pub fn signal(&self) -> Result<FenceValue> {
        let value = self.fence_manager.next_value();
        unsafe {
            self.command_queue
                .Signal(&self.fence, value.value())
                .map_err(command_error("Failed to signal fence"))?;
        }
        Ok(value)
    }

    /// 阻塞直到 GPU 越过 `value`
    pub fn wait_for_fence(&self, value: FenceValue) -> Result<()> {
        unsafe {
            if self.fence.GetCompletedValue() < value.value() {
                self.fence
                    .SetEventOnCompletion(value.value(), self.fence_event)
                    .map_err(command_error("Failed to set fence event"))?;
                WaitForSingleObject(self.fence_event, INFINITE);
            }
            self.fence_manager
                .update_completed_value(FenceValue::new(self.fence.GetCompletedValue()));
        }
        Ok(())
    }

    /// GPU 已经完成的围栏值
    pub fn completed_fence(&self) -> FenceValue {
        let completed = FenceValue::new(unsafe { self.fence.GetCompletedValue() });
        self.fence_manager.update_completed_value(completed);
        completed
    }

    /// 等待队列中所有命令执行完
    pub fn flush(&self) -> Result<()> {
        let value = self.signal()?;
        self.wait_for_fence(value)
    }

    /// 显示后台缓冲并切换到下一个
    pub fn present(&mut self) -> Result<()> {
        let sync_interval = u32::from(self.vsync);
        unsafe {
            self.swap_chain
                .Present(sync_interval, DXGI_PRESENT(0))
                .ok()
                .map_err(|e| GraphicsError::SwapchainError(format!("Present failed: {:?}", e)))?;
        }
        self.current_back_buffer = (self.current_back_buffer + 1) % SWAP_CHAIN_BUFFER_COUNT;
        Ok(())
    }

    /// 按窗口当前大小重建交换链缓冲和深度模板缓冲
    ///
    /// 窗口最小化时大小为 0，此时什么都不做。
    pub fn resize(&mut self) -> Result<()> {
        let size = self.window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Ok(());
        }

        self.flush()?;
        self.reset_command_list(None)?;

        self.width = size.width;
        self.height = size.height;

        // 交换链缓冲的所有引用必须先释放
        self.swap_chain_buffers.clear();
        self.depth_stencil_buffer = None;

        unsafe {
            self.swap_chain
                .ResizeBuffers(
                    SWAP_CHAIN_BUFFER_COUNT as u32,
                    self.width,
                    self.height,
                    BACK_BUFFER_FORMAT,
                    DXGI_SWAP_CHAIN_FLAG_ALLOW_MODE_SWITCH,
                )
                .map_err(|e| GraphicsError::SwapchainError(format!("ResizeBuffers failed: {:?}", e)))?;

            for i in 0..SWAP_CHAIN_BUFFER_COUNT {
                let buffer: ID3D12Resource = self
                    .swap_chain
                    .GetBuffer(i as u32)
                    .map_err(|e| GraphicsError::SwapchainError(format!("GetBuffer failed: {:?}", e)))?;
                self.device
                    .CreateRenderTargetView(&buffer, None, self.rtv_heap.cpu_handle(i));
                self.swap_chain_buffers.push(buffer);
            }
            self.current_back_buffer = 0;

            let depth_desc = D3D12_RESOURCE_DESC {
                Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                Alignment: 0,
                Width: self.width as u64,
                Height: self.height,
                DepthOrArraySize: 1,
                MipLevels: 1,
                Format: DEPTH_STENCIL_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
                Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
            };
            let clear_value = D3D12_CLEAR_VALUE {
                Format: DEPTH_STENCIL_FORMAT,
                Anonymous: D3D12_CLEAR_VALUE_0 {
                    DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                        Depth: 1.0,
                        Stencil: 0,
                    },
                },
            };
            let heap_props = D3D12_HEAP_PROPERTIES {
                Type: D3D12_HEAP_TYPE_DEFAULT,
                ..Default::default()
            };

            let mut depth_stencil_buffer: Option<ID3D12Resource> = None;
            self.device
                .CreateCommittedResource(
                    &heap_props,
                    D3D12_HEAP_FLAG_NONE,
                    &depth_desc,
                    D3D12_RESOURCE_STATE_COMMON,
                    Some(&clear_value),
                    &mut depth_stencil_buffer,
                )
                .map_err(creation_error("Failed to create depth stencil buffer"))?;
            let depth_stencil_buffer = depth_stencil_buffer.ok_or_else(|| {
                GraphicsError::ResourceCreation("Depth stencil buffer is null".to_string())
            })?;

            self.device
                .CreateDepthStencilView(&depth_stencil_buffer, None, self.dsv_heap.cpu_handle(0));
            self.transition(
                &depth_stencil_buffer,
                D3D12_RESOURCE_STATE_COMMON,
                D3D12_RESOURCE_STATE_DEPTH_WRITE,
            );
            self.depth_stencil_buffer = Some(depth_stencil_buffer);
        }

        self.execute_command_list()?;
        self.flush()?;

        self.viewport = D3D12_VIEWPORT {
            TopLeftX: 0.0,
            TopLeftY: 0.0,
            Width: self.width as f32,
            Height: self.height as f32,
            MinDepth: 0.0,
            MaxDepth: 1.0,
        };
        self.scissor_rect = RECT {
            left: 0,
            top: 0,
            right: self.width as i32,
            bottom: self.height as i32,
        };

        engine_debug!(width = self.width, height = self.height, "Resize completed");
        Ok(())
    }
}

impl Drop for Dx12Context {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            engine_warn!(error = %e, "Failed to flush command queue on shutdown");
        }
        unsafe {
            let _ = CloseHandle(self.fence_event);
        }
        engine_debug!("DX12 context dropped");
    }
}

/// 优先使用默认硬件适配器，不支持时退回 WARP
unsafe fn create_device(factory: &IDXGIFactory4) -> Result<ID3D12Device> {
    let mut device: Option<ID3D12Device> = None;
    if D3D12CreateDevice(None::<&windows::core::IUnknown>, D3D_FEATURE_LEVEL_11_0, &mut device).is_ok() {
        if let Some(device) = device {
            engine_info!("D3D12 hardware device created");
            return Ok(device);
        }
    }

    engine_warn!("Hardware device unavailable, falling back to WARP");
    let warp: IDXGIAdapter = factory
        .EnumWarpAdapter()
        .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to enumerate WARP adapter: {:?}", e)))?;

    let mut device: Option<ID3D12Device> = None;
    D3D12CreateDevice(&warp, D3D_FEATURE_LEVEL_11_0, &mut device)
        .map_err(|e| GraphicsError::DeviceCreation(format!("Failed to create D3D12 device: {:?}", e)))?;
    device.ok_or_else(|| GraphicsError::DeviceCreation("D3D12 device is null".to_string()).into())
}

/// winit 0.29 通过 raw-window-handle 暴露 HWND
fn window_hwnd(window: &Window) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| DemoError::Initialization(format!("Failed to get window handle: {}", e)))?;
    match handle.as_raw() {
        RawWindowHandle::Win32(win32) => Ok(HWND(win32.hwnd.get() as *mut core::ffi::c_void)),
        other => Err(DemoError::Initialization(format!(
            "Expected a Win32 window handle, got {:?}",
            other
        ))),
    }
}
