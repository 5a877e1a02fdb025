//! 帧资源模块
//!
//! 常量缓冲区对齐规则，以及三缓冲的帧资源环。
//!
//! # 设计说明
//!
//! 使用三个帧资源循环使用：
//! - 帧 N: CPU正在写入
//! - 帧 N-1: GPU正在处理
//! - 帧 N-2: 完成，可以复用
//!
//! 每个槽位记录提交时的 Fence 值。CPU 切换到某个槽位时，如果 GPU 还没完成到这个值，
//! 就必须等待，否则会覆盖 GPU 正在读取的常量缓冲区。

use super::sync::FenceValue;

/// 帧资源数量
pub const NUM_FRAME_RESOURCES: usize = 3;

/// 常量缓冲区大小（DirectX 12 要求256字节对齐）
pub const fn constant_buffer_byte_size(byte_size: usize) -> usize {
    (byte_size + 255) & !255
}

/// 上传缓冲区中每个元素占用的字节数
///
/// 常量缓冲区按256字节对齐，顶点数据紧密排列。
pub const fn upload_element_byte_size(byte_size: usize, is_constant_buffer: bool) -> usize {
    if is_constant_buffer {
        constant_buffer_byte_size(byte_size)
    } else {
        byte_size
    }
}

/// 帧资源槽位
#[derive(Debug)]
pub struct FrameSlot<T> {
    /// 槽位中的资源（命令分配器、常量缓冲区等）
    pub resource: T,
    /// 最近一次提交时 signal 的 Fence 值，0 表示从未提交
    pub fence: FenceValue,
}

/// 帧资源环
#[derive(Debug)]
pub struct FrameResourceRing<T> {
    slots: Vec<FrameSlot<T>>,
    current_index: usize,
}

impl<T> FrameResourceRing<T> {
    /// 用工厂函数为每个槽位创建资源
    pub fn new<F, E>(mut make: F) -> Result<Self, E>
    where
        F: FnMut(usize) -> Result<T, E>,
    {
        let slots = (0..NUM_FRAME_RESOURCES)
            .map(|i| {
                Ok(FrameSlot {
                    resource: make(i)?,
                    fence: FenceValue::default(),
                })
            })
            .collect::<Result<Vec<_>, E>>()?;

        Ok(Self {
            slots,
            current_index: 0,
        })
    }

    /// 当前帧索引
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// 当前帧资源
    pub fn current(&self) -> &T {
        &self.slots[self.current_index].resource
    }

    /// 当前帧资源的可变引用
    pub fn current_mut(&mut self) -> &mut T {
        &mut self.slots[self.current_index].resource
    }

    /// 移动到下一帧
    pub fn advance(&mut self) {
        self.current_index = (self.current_index + 1) % self.slots.len();
    }

    /// 当前槽位需要等待的 Fence 值
    ///
    /// 槽位提交过且 GPU 还没完成到该值时返回 `Some`。
    pub fn fence_to_wait(&self, completed: FenceValue) -> Option<FenceValue> {
        let fence = self.slots[self.current_index].fence;
        if fence.value() != 0 && completed < fence {
            Some(fence)
        } else {
            None
        }
    }

    /// 记录当前槽位提交时 signal 的 Fence 值
    pub fn mark_submitted(&mut self, fence: FenceValue) {
        self.slots[self.current_index].fence = fence;
    }

    /// 遍历全部资源
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.slots.iter_mut().map(|slot| &mut slot.resource)
    }

    /// 槽位数量
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn ring() -> FrameResourceRing<usize> {
        FrameResourceRing::new(|i| Ok::<_, Infallible>(i * 10)).unwrap()
    }

    #[test]
    fn test_constant_buffer_alignment() {
        assert_eq!(constant_buffer_byte_size(100), 256);
        assert_eq!(constant_buffer_byte_size(256), 256);
        assert_eq!(constant_buffer_byte_size(300), 512);
        assert_eq!(upload_element_byte_size(32, false), 32);
        assert_eq!(upload_element_byte_size(32, true), 256);
    }

    #[test]
    fn test_ring_cycles_through_slots() {
        let mut ring = ring();
        assert_eq!(ring.len(), NUM_FRAME_RESOURCES);
        assert_eq!(*ring.current(), 0);

        ring.advance();
        assert_eq!(*ring.current(), 10);
        ring.advance();
        ring.advance();
        assert_eq!(ring.current_index(), 0);
    }

    #[test]
    fn test_fresh_slot_never_waits() {
        let ring = ring();
        assert_eq!(ring.fence_to_wait(FenceValue::new(0)), None);
    }

    #[test]
    fn test_fence_to_wait() {
        let mut ring = ring();

        // 模拟渲染循环：每帧提交一个新的 fence
        for fence in 1..=3u64 {
            ring.advance();
            ring.mark_submitted(FenceValue::new(fence));
        }

        // 回到第一次提交的槽位（fence = 1）
        ring.advance();
        assert_eq!(ring.fence_to_wait(FenceValue::new(0)), Some(FenceValue::new(1)));
        assert_eq!(ring.fence_to_wait(FenceValue::new(1)), None);
    }

    #[test]
    fn test_factory_error_propagates() {
        let result = FrameResourceRing::<u32>::new(|i| if i == 2 { Err("boom") } else { Ok(0) });
        assert!(result.is_err());
    }
}
