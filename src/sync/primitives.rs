//! 同步原语封装
//!
//! 基于 embassy-sync 提供的同步原语，统一使用 CriticalSectionRawMutex
//! 以确保在中断执行器之间 (不同优先级互相抢占) 访问的正确性。

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};

// ===== 类型别名: 简化使用 =====

/// 临界区通道 - MPMC 消息队列
///
/// 支持多发送者多接收者，固定容量
///
/// # Type Parameters
/// * `T` - 消息类型
/// * `N` - 队列容量
///
/// # Example
/// ```ignore
/// static CHANNEL: CriticalChannel<Message, 8> = CriticalChannel::new();
///
/// // 发送方 (非阻塞)
/// CHANNEL.try_send(msg).ok();
///
/// // 接收方 (非阻塞)
/// let msg = CHANNEL.try_receive();
/// ```
pub type CriticalChannel<T, const N: usize> = Channel<CriticalSectionRawMutex, T, N>;

// ===== 原子操作封装 =====

// Xtensa 没有原生 64 位原子，计数器统一使用 32 位
use portable_atomic::{AtomicU32, Ordering};

/// 原子计数器 - 用于统计
///
/// 回绕计数，不会溢出 panic。
pub struct AtomicCounter {
    count: AtomicU32,
}

impl AtomicCounter {
    /// 创建新的计数器
    pub const fn new() -> Self {
        Self {
            count: AtomicU32::new(0),
        }
    }

    /// 增加并返回新值
    #[inline(always)]
    pub fn increment(&self) -> u32 {
        self.count.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// 增加指定值并返回新值
    #[inline(always)]
    pub fn add(&self, value: u32) -> u32 {
        self.count.fetch_add(value, Ordering::Relaxed).wrapping_add(value)
    }

    /// 获取当前值
    #[inline(always)]
    pub fn get(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}

impl Default for AtomicCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// 原子最大值 - 记录观测到的峰值
pub struct AtomicMax {
    value: AtomicU32,
}

impl AtomicMax {
    pub const fn new() -> Self {
        Self {
            value: AtomicU32::new(0),
        }
    }

    /// 提交一个观测值，返回更新后的峰值
    #[inline(always)]
    pub fn observe(&self, value: u32) -> u32 {
        self.value.fetch_max(value, Ordering::Relaxed).max(value)
    }

    #[inline(always)]
    pub fn get(&self) -> u32 {
        self.value.load(Ordering::Relaxed)
    }
}

impl Default for AtomicMax {
    fn default() -> Self {
        Self::new()
    }
}
