//! GPU 同步机制模块
//!
//! Fence 值的 CPU 侧记录。Direct3D 12 的 `ID3D12Fence` 负责真正的等待，
//! 这里只跟踪"已经 signal 到哪里"和"GPU 已经完成到哪里"。
//!
//! # 使用场景
//!
//! 1. **帧同步**：帧资源被复用前，确认 GPU 已经用完它
//! 2. **初始化/resize**：刷新命令队列，等待全部工作完成

use std::sync::atomic::{AtomicU64, Ordering};

/// Fence 值
///
/// 用于CPU-GPU同步的单调递增值。
/// CPU可以等待GPU完成特定Fence值对应的工作。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FenceValue(u64);

impl FenceValue {
    /// 创建新的Fence值
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// 获取内部值
    pub fn value(&self) -> u64 {
        self.0
    }

    /// 下一个Fence值
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

/// Fence 管理器
///
/// 在 signal 前取 `next_value()`，在读取 `GetCompletedValue` 后调用
/// `update_completed_value()`。
///
/// ```
/// use dx12_demos::renderer::sync::FenceManager;
///
/// let fences = FenceManager::new();
/// let value = fences.next_value();
/// // queue.Signal(fence, value.value());
/// fences.update_completed_value(value);
/// assert!(fences.is_completed(value));
/// ```
#[derive(Debug, Default)]
pub struct FenceManager {
    /// 当前Fence值（CPU侧）
    current_value: AtomicU64,
    /// 已完成的Fence值（GPU侧）
    completed_value: AtomicU64,
}

impl FenceManager {
    /// 创建新的Fence管理器
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前Fence值
    pub fn current_value(&self) -> FenceValue {
        FenceValue::new(self.current_value.load(Ordering::Acquire))
    }

    /// 获取已完成的Fence值
    pub fn completed_value(&self) -> FenceValue {
        FenceValue::new(self.completed_value.load(Ordering::Acquire))
    }

    /// 获取下一个Fence值并递增计数器
    pub fn next_value(&self) -> FenceValue {
        let value = self.current_value.fetch_add(1, Ordering::AcqRel);
        FenceValue::new(value + 1)
    }

    /// 更新已完成的Fence值
    ///
    /// 已完成的值只会前进，不会后退
    pub fn update_completed_value(&self, value: FenceValue) {
        self.completed_value.fetch_max(value.value(), Ordering::AcqRel);
    }

    /// 检查特定Fence值是否已完成
    pub fn is_completed(&self, value: FenceValue) -> bool {
        self.completed_value() >= value
    }

    /// 重置Fence管理器
    pub fn reset(&self) {
        self.current_value.store(0, Ordering::Release);
        self.completed_value.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fence_value() {
        let fence = FenceValue::new(1);
        assert_eq!(fence.value(), 1);
        assert_eq!(fence.next().value(), 2);
        assert_eq!(FenceValue::default().value(), 0);
    }

    #[test]
    fn test_fence_manager() {
        let manager = FenceManager::new();

        assert_eq!(manager.current_value().value(), 0);
        assert_eq!(manager.completed_value().value(), 0);

        let v1 = manager.next_value();
        assert_eq!(v1.value(), 1);
        assert_eq!(manager.current_value().value(), 1);

        let v2 = manager.next_value();
        assert_eq!(v2.value(), 2);

        // 模拟GPU完成
        manager.update_completed_value(v1);
        assert!(manager.is_completed(v1));
        assert!(!manager.is_completed(v2));

        manager.update_completed_value(v2);
        assert!(manager.is_completed(v2));
    }

    #[test]
    fn test_completed_value_never_goes_back() {
        let manager = FenceManager::new();
        manager.update_completed_value(FenceValue::new(5));
        manager.update_completed_value(FenceValue::new(3));
        assert_eq!(manager.completed_value().value(), 5);

        manager.reset();
        assert_eq!(manager.completed_value().value(), 0);
        assert_eq!(manager.current_value().value(), 0);
    }
}
