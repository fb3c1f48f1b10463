//! 确定性周期调度器
//!
//! 板上的抢占由 Embassy 中断执行器完成，这里是同一调度契约的离散
//! tick 模型: 每个 tick 释放到期的作业，选出最高优先级 (或最早截止)
//! 的待执行作业并给它一个 tick 的 CPU。用于主机侧的可调度性分析和测试。
//!
//! 作业的相对截止时间等于周期。

use heapless::Vec;

use super::clock::{reached, Tick};
use super::release::PeriodicRelease;
use super::task::{TaskDescriptor, TaskId};
use crate::config::{self, TaskConfig, MAX_TASKS};
use crate::error::ConfigError;
use crate::util::log::*;

/// 分派策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchPolicy {
    /// 静态优先级抢占，同优先级按表顺序
    #[default]
    FixedPriority,
    /// 最早绝对截止时间优先，平局看优先级，再看表顺序
    EarliestDeadlineFirst,
}

/// 分派计数
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchCounters {
    pub context_switches: u32,
    pub preemptions: u32,
    pub busy_ticks: u32,
    pub idle_ticks: u32,
}

struct Slot {
    desc: TaskDescriptor,
    release: PeriodicRelease,
    cost: Tick,
    /// 已释放未完成的作业数 (含正在执行的)
    pending: u32,
    /// 队头作业剩余执行 tick
    remaining: Tick,
    /// 队头作业的释放时刻
    head_release: Tick,
    completions: u32,
    deadline_misses: u32,
}

impl Slot {
    fn new(cfg: &TaskConfig) -> Self {
        Self {
            desc: TaskDescriptor::new(cfg.id, cfg.period, cfg.priority),
            release: PeriodicRelease::new(0, cfg.period),
            cost: cfg.cost,
            pending: 0,
            remaining: 0,
            head_release: 0,
            completions: 0,
            deadline_misses: 0,
        }
    }

    fn push_job(&mut self, at: Tick) {
        if self.pending == 0 {
            self.head_release = at;
            self.remaining = self.cost;
        }
        self.pending += 1;
        self.desc.last_release = at;
    }

    #[inline]
    fn deadline(&self) -> Tick {
        self.head_release.wrapping_add(self.desc.period)
    }

    /// 队头作业在 `finish` 时刻完成
    fn complete(&mut self, finish: Tick) {
        if !reached(self.deadline(), finish) {
            self.deadline_misses += 1;
        }
        self.completions += 1;
        self.pending -= 1;
        if self.pending > 0 {
            self.head_release = self.head_release.wrapping_add(self.desc.period);
            self.remaining = self.cost;
        }
    }

    #[inline]
    fn runnable(&self) -> bool {
        self.pending > 0 && self.remaining > 0
    }
}

/// 周期调度器
pub struct Scheduler<const N: usize = MAX_TASKS> {
    slots: Vec<Slot, N>,
    policy: DispatchPolicy,
    now: Tick,
    last_run: Option<usize>,
    counters: DispatchCounters,
}

impl<const N: usize> Scheduler<N> {
    /// 校验任务表并建立调度器
    pub fn from_table(table: &[TaskConfig], policy: DispatchPolicy) -> Result<Self, ConfigError> {
        config::validate(table)?;
        let mut slots = Vec::new();
        for cfg in table {
            slots.push(Slot::new(cfg)).map_err(|_| ConfigError::TooManyTasks)?;
        }
        Ok(Self {
            slots,
            policy,
            now: 0,
            last_run: None,
            counters: DispatchCounters::default(),
        })
    }

    /// 在 `now` 同时释放所有任务
    pub fn start(&mut self, now: Tick) {
        self.now = now;
        self.last_run = None;
        for slot in self.slots.iter_mut() {
            slot.release = PeriodicRelease::new(now, slot.desc.period);
            slot.pending = 0;
            slot.push_job(now);
        }
        log_debug!("scheduler started at {} with {} tasks", now, self.slots.len());
    }

    /// 前进一个 tick，返回这个 tick 占用 CPU 的任务 (`None` 为空闲)
    pub fn tick(&mut self) -> Option<TaskId> {
        let now = self.now;

        // 1. 释放到期作业，错过的释放逐个补上
        for slot in self.slots.iter_mut() {
            while slot.release.is_due(now) {
                slot.release.advance(now);
                let at = slot.release.last_release();
                slot.push_job(at);
            }
        }

        // 2. 零开销作业瞬间完成
        for slot in self.slots.iter_mut() {
            while slot.pending > 0 && slot.remaining == 0 {
                slot.complete(now);
            }
        }

        // 3. 分派
        let chosen = self.pick();
        match chosen {
            Some(i) => {
                if self.last_run != Some(i) {
                    self.counters.context_switches += 1;
                    if let Some(prev) = self.last_run {
                        let p = &self.slots[prev];
                        // 上一个作业已经开始但没做完
                        if p.runnable() && p.remaining < p.cost {
                            self.counters.preemptions += 1;
                        }
                    }
                }
                self.counters.busy_ticks += 1;
                let slot = &mut self.slots[i];
                slot.remaining -= 1;
                if slot.remaining == 0 {
                    slot.complete(now.wrapping_add(1));
                }
                self.last_run = Some(i);
            }
            None => {
                self.counters.idle_ticks += 1;
                self.last_run = None;
            }
        }

        self.now = now.wrapping_add(1);
        chosen.map(|i| self.slots[i].desc.id)
    }

    /// 连续运行 `ticks` 个 tick
    pub fn run_for(&mut self, ticks: Tick) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    fn pick(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, slot) in self.slots.iter().enumerate() {
            if !slot.runnable() {
                continue;
            }
            best = match best {
                Some(b) if !self.precedes(slot, &self.slots[b]) => Some(b),
                _ => Some(i),
            };
        }
        best
    }

    /// `a` 是否严格优先于 `b` (相等时保留表中靠前的)
    fn precedes(&self, a: &Slot, b: &Slot) -> bool {
        match self.policy {
            DispatchPolicy::FixedPriority => a.desc.priority > b.desc.priority,
            DispatchPolicy::EarliestDeadlineFirst => {
                let (da, db) = (a.deadline(), b.deadline());
                if da != db {
                    (da.wrapping_sub(db) as i32) < 0
                } else {
                    a.desc.priority > b.desc.priority
                }
            }
        }
    }

    // ===== 查询 =====

    #[inline]
    pub fn now(&self) -> Tick {
        self.now
    }

    #[inline]
    pub fn policy(&self) -> DispatchPolicy {
        self.policy
    }

    #[inline]
    pub fn counters(&self) -> DispatchCounters {
        self.counters
    }

    fn slot(&self, id: TaskId) -> Option<&Slot> {
        self.slots.iter().find(|s| s.desc.id == id)
    }

    pub fn descriptor(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.slot(id).map(|s| &s.desc)
    }

    pub fn completions(&self, id: TaskId) -> u32 {
        self.slot(id).map_or(0, |s| s.completions)
    }

    pub fn deadline_misses(&self, id: TaskId) -> u32 {
        self.slot(id).map_or(0, |s| s.deadline_misses)
    }

    pub fn pending(&self, id: TaskId) -> u32 {
        self.slot(id).map_or(0, |s| s.pending)
    }

    // ===== 可调度性分析 =====

    /// 总利用率 (千分比)
    pub fn utilization_permille(&self) -> u32 {
        self.slots
            .iter()
            .map(|s| (s.cost as u64 * 1000 / s.desc.period as u64) as u32)
            .sum()
    }

    /// 利用率测试
    ///
    /// 固定优先级用 Liu & Layland 上界 (充分条件)，EDF 用 U <= 1。
    pub fn is_schedulable(&self) -> bool {
        let u = self.utilization_permille();
        match self.policy {
            DispatchPolicy::FixedPriority => u <= liu_layland_permille(self.slots.len()),
            DispatchPolicy::EarliestDeadlineFirst => u <= 1000,
        }
    }
}

/// Liu & Layland 上界 n(2^(1/n) - 1)，千分比
fn liu_layland_permille(n: usize) -> u32 {
    const BOUNDS: [u32; 10] = [1000, 1000, 828, 780, 757, 743, 735, 729, 724, 693];
    BOUNDS[n.min(9)]
}
