//! 监视器上下文
//!
//! 队列与统计是仅有的共享状态。它们集中在一个上下文对象里，
//! 在创建任务时以引用传入，而不是作为进程级全局变量存在。

use crate::config::QUEUE_CAPACITY;
use crate::sched::clock::Tick;
use crate::sched::stats::{RunTimeStats, StatsSnapshot};
use crate::sync::queue::MessageQueue;

/// 共享上下文
///
/// `N` 为队列容量，固件使用 `QUEUE_CAPACITY`。
pub struct MonitorContext<const N: usize = QUEUE_CAPACITY> {
    queue: MessageQueue<N>,
    stats: RunTimeStats,
}

impl<const N: usize> MonitorContext<N> {
    pub const fn new() -> Self {
        Self {
            queue: MessageQueue::new(),
            stats: RunTimeStats::new(),
        }
    }

    /// 共享消息队列
    #[inline(always)]
    pub fn queue(&self) -> &MessageQueue<N> {
        &self.queue
    }

    /// 运行时统计
    #[inline(always)]
    pub fn stats(&self) -> &RunTimeStats {
        &self.stats
    }

    /// 统计快照
    pub fn snapshot(&self, now: Tick) -> StatsSnapshot {
        self.stats.snapshot(now)
    }
}

impl<const N: usize> Default for MonitorContext<N> {
    fn default() -> Self {
        Self::new()
    }
}
