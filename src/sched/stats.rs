//! 运行时统计与 CPU 负载
//!
//! 每个任务一组无锁计数器，由任务自己在每个周期结束时更新。
//! 读取时在临界区内拍一份快照，保证各计数器彼此一致。
//!
//! CPU 负载按 "各任务周期体执行时长之和 / 经过时长" 估算。执行时长从
//! 进入周期体量到离开周期体，包含被更高优先级抢占的时间，
//! 所以结果是上界，最终截断到 100%。

use core::fmt;

use portable_atomic::{AtomicU32, Ordering};

use super::clock::Tick;
use super::task::TaskId;
use crate::sync::primitives::{AtomicCounter, AtomicMax};

/// 单个任务的计数器
pub struct TaskCounters {
    releases: AtomicCounter,
    overruns: AtomicCounter,
    busy_ticks: AtomicCounter,
    max_busy: AtomicMax,
    sent: AtomicCounter,
    dropped: AtomicCounter,
}

impl TaskCounters {
    pub const fn new() -> Self {
        Self {
            releases: AtomicCounter::new(),
            overruns: AtomicCounter::new(),
            busy_ticks: AtomicCounter::new(),
            max_busy: AtomicMax::new(),
            sent: AtomicCounter::new(),
            dropped: AtomicCounter::new(),
        }
    }

    fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            releases: self.releases.get(),
            overruns: self.overruns.get(),
            busy_ticks: self.busy_ticks.get(),
            max_busy: self.max_busy.get(),
            sent: self.sent.get(),
            dropped: self.dropped.get(),
        }
    }
}

impl Default for TaskCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// 全部运行时统计
pub struct RunTimeStats {
    tasks: [TaskCounters; TaskId::COUNT],
    forwarded: AtomicCounter,
    sink_errors: AtomicCounter,
    pin_errors: AtomicCounter,
    started_at: AtomicU32,
}

impl RunTimeStats {
    pub const fn new() -> Self {
        const INIT: TaskCounters = TaskCounters::new();
        Self {
            tasks: [INIT; TaskId::COUNT],
            forwarded: AtomicCounter::new(),
            sink_errors: AtomicCounter::new(),
            pin_errors: AtomicCounter::new(),
            started_at: AtomicU32::new(0),
        }
    }

    /// 记录统计起点 (调度开始时刻)
    pub fn mark_start(&self, now: Tick) {
        self.started_at.store(now, Ordering::Relaxed);
    }

    #[inline]
    fn task(&self, id: TaskId) -> &TaskCounters {
        &self.tasks[id.index()]
    }

    /// 一个周期体执行完毕，占用 `busy` 个 tick
    pub fn record_cycle(&self, id: TaskId, busy: Tick) {
        let task = self.task(id);
        task.releases.increment();
        task.busy_ticks.add(busy);
        task.max_busy.observe(busy);
    }

    /// 下一次释放时刻在周期体结束前就已经过去
    pub fn record_overrun(&self, id: TaskId) {
        self.task(id).overruns.increment();
    }

    /// 消息成功入队
    pub fn record_sent(&self, id: TaskId) {
        self.task(id).sent.increment();
    }

    /// 消息因队列满 / 超时被丢弃
    pub fn record_dropped(&self, id: TaskId) {
        self.task(id).dropped.increment();
    }

    /// 消息已写到输出汇点
    pub fn record_forwarded(&self) {
        self.forwarded.increment();
    }

    pub fn record_sink_error(&self) {
        self.sink_errors.increment();
    }

    pub fn record_pin_error(&self) {
        self.pin_errors.increment();
    }

    /// 一致性快照
    pub fn snapshot(&self, now: Tick) -> StatsSnapshot {
        critical_section::with(|_cs| {
            let mut tasks = [TaskSnapshot::default(); TaskId::COUNT];
            for (slot, counters) in tasks.iter_mut().zip(self.tasks.iter()) {
                *slot = counters.snapshot();
            }
            StatsSnapshot {
                tasks,
                forwarded: self.forwarded.get(),
                sink_errors: self.sink_errors.get(),
                pin_errors: self.pin_errors.get(),
                elapsed: now.wrapping_sub(self.started_at.load(Ordering::Relaxed)),
            }
        })
    }
}

impl Default for RunTimeStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个任务的计数快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSnapshot {
    pub releases: u32,
    pub overruns: u32,
    pub busy_ticks: u32,
    pub max_busy: u32,
    pub sent: u32,
    pub dropped: u32,
}

/// 统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tasks: [TaskSnapshot; TaskId::COUNT],
    pub forwarded: u32,
    pub sink_errors: u32,
    pub pin_errors: u32,
    /// 自统计起点经过的 tick
    pub elapsed: Tick,
}

impl StatsSnapshot {
    #[inline]
    pub fn task(&self, id: TaskId) -> &TaskSnapshot {
        &self.tasks[id.index()]
    }

    /// 所有任务的忙碌 tick 之和
    pub fn total_busy(&self) -> u64 {
        self.tasks.iter().map(|t| t.busy_ticks as u64).sum()
    }

    /// CPU 负载 (千分比，最大 1000)
    pub fn cpu_load_permille(&self) -> u32 {
        if self.elapsed == 0 {
            return 0;
        }
        let load = self.total_busy() * 1000 / self.elapsed as u64;
        load.min(1000) as u32
    }

    /// 全部任务丢弃的消息数
    pub fn total_dropped(&self) -> u32 {
        self.tasks.iter().fold(0u32, |acc, t| acc.wrapping_add(t.dropped))
    }

    /// 输出文本报告，每个任务一行
    ///
    /// ```text
    /// Button_1_Monitor      40  0   0
    /// ...
    /// cpu 62.0%
    /// ```
    /// 列依次为: 释放次数、忙碌 tick、超限次数。
    pub fn write_report<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        for id in TaskId::ALL {
            let t = self.task(id);
            writeln!(
                out,
                "{:<20}{:>6}{:>6}{:>4}",
                id.name(),
                t.releases,
                t.busy_ticks,
                t.overruns
            )?;
        }
        let load = self.cpu_load_permille();
        writeln!(out, "cpu {}.{}%", load / 10, load % 10)
    }
}
