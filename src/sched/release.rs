//! 周期释放
//!
//! 每个任务在自己上一次 *计划* 释放时刻的基础上加一个周期得到下一次
//! 释放时刻，与周期体何时结束无关，因此周期体的执行时长不会让释放时刻
//! 漂移: 第 n 次释放恒为 `t0 + n * period`。
//!
//! # 超限策略
//!
//! 周期体结束时下一次释放时刻已经过去 (超限)，任务立即再次释放，
//! 不合并错过的释放: 超限 k 个周期就会背靠背地连续释放 k 次，
//! 直到重新赶上计划时刻。释放时刻本身始终留在原来的网格上。

use super::clock::{reached, Tick, TickSource};
use super::task::TaskId;
use crate::context::MonitorContext;
use crate::util::log::*;

/// 一次 `advance` 的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// 下一次释放在将来，睡眠到 `at`
    Sleep(Tick),
    /// 下一次释放已经过去 `late_by` 个 tick，立即释放
    Overrun { release: Tick, late_by: Tick },
}

impl Release {
    /// 本次释放的计划时刻
    pub const fn at(&self) -> Tick {
        match *self {
            Release::Sleep(at) => at,
            Release::Overrun { release, .. } => release,
        }
    }
}

/// 无漂移的周期释放 (delay-until 语义)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicRelease {
    period: Tick,
    last_release: Tick,
}

impl PeriodicRelease {
    /// `origin` 即第一次释放时刻
    pub const fn new(origin: Tick, period: Tick) -> Self {
        Self {
            period,
            last_release: origin,
        }
    }

    #[inline(always)]
    pub const fn period(&self) -> Tick {
        self.period
    }

    /// 最近一次计划释放时刻
    #[inline(always)]
    pub const fn last_release(&self) -> Tick {
        self.last_release
    }

    /// 下一次计划释放时刻
    #[inline(always)]
    pub const fn next_release(&self) -> Tick {
        self.last_release.wrapping_add(self.period)
    }

    /// 下一次释放是否已到
    #[inline(always)]
    pub const fn is_due(&self, now: Tick) -> bool {
        reached(now, self.next_release())
    }

    /// 前进到下一次释放
    ///
    /// 基准只加一个周期，与 `now` 无关；`now` 只用来判断是否已超限。
    pub fn advance(&mut self, now: Tick) -> Release {
        let next = self.next_release();
        self.last_release = next;
        if reached(now, next) {
            // 恰好到点时 late_by 为 0: 不需要睡眠，也不算超限
            Release::Overrun {
                release: next,
                late_by: now.wrapping_sub(next),
            }
        } else {
            Release::Sleep(next)
        }
    }
}

/// 能够睡眠到绝对时刻的定时器
#[allow(async_fn_in_trait)]
pub trait ReleaseTimer: TickSource {
    /// 挂起当前任务直到 `at` (已经过去则立即返回)
    async fn wait_until(&mut self, at: Tick);
}

impl ReleaseTimer for super::clock::EmbassyClock {
    async fn wait_until(&mut self, at: Tick) {
        embassy_time::Timer::at(Self::instant_at(at)).await;
    }
}

impl ReleaseTimer for &super::clock::ManualClock {
    async fn wait_until(&mut self, at: Tick) {
        self.jump_to(at);
    }
}

/// 周期任务
///
/// `run_period` 是一个周期内要做的全部工作；失败一律在内部吞掉，
/// 不向调度层传播。
#[allow(async_fn_in_trait)]
pub trait PeriodicTask {
    fn id(&self) -> TaskId;

    async fn run_period<const N: usize>(&mut self, ctx: &MonitorContext<N>);
}

/// 周期任务运行器
///
/// 按 `PeriodicRelease` 的计划反复执行一个 `PeriodicTask`。
/// 统计与日志一律记在任务自己的 `id()` 名下。
pub struct PeriodicRunner<T> {
    release: PeriodicRelease,
    timer: T,
}

impl<T: ReleaseTimer> PeriodicRunner<T> {
    /// 以当前时刻作为第一次释放
    pub fn new(period: Tick, timer: T) -> Self {
        let origin = timer.now();
        Self {
            release: PeriodicRelease::new(origin, period),
            timer,
        }
    }

    #[inline]
    pub fn release(&self) -> &PeriodicRelease {
        &self.release
    }

    /// 执行一个周期: 运行周期体、记录统计、等待下一次释放
    pub async fn cycle<P: PeriodicTask, const N: usize>(
        &mut self,
        task: &mut P,
        ctx: &MonitorContext<N>,
    ) -> Release {
        let id = task.id();
        let entry = self.timer.now();
        task.run_period(ctx).await;
        let exit = self.timer.now();
        ctx.stats().record_cycle(id, exit.wrapping_sub(entry));

        let release = self.release.advance(exit);
        match release {
            Release::Sleep(at) => self.timer.wait_until(at).await,
            Release::Overrun { late_by: 0, .. } => {}
            Release::Overrun { release: at, late_by } => {
                ctx.stats().record_overrun(id);
                log_warn!("{} overran release {} by {} ticks", id.name(), at, late_by);
            }
        }
        release
    }

    /// 永远运行 (没有退出路径)
    pub async fn run<P: PeriodicTask, const N: usize>(mut self, mut task: P, ctx: &MonitorContext<N>) -> ! {
        log_info!("{} started, period {} ticks", task.id().name(), self.release.period());
        loop {
            self.cycle(&mut task, ctx).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sched::clock::ManualClock;
    use embassy_futures::block_on;
    use std::vec::Vec;

    #[test]
    fn test_release_grid_without_overrun() {
        let mut rel = PeriodicRelease::new(1000, 50);
        assert_eq!(rel.advance(1003), Release::Sleep(1050));
        // 周期体长短不影响下一次释放时刻
        assert_eq!(rel.advance(1090), Release::Sleep(1100));
        assert_eq!(rel.advance(1100), Release::Sleep(1150));
        assert_eq!(rel.advance(1150).at(), 1200);
    }

    #[test]
    fn test_overrun_catches_up_back_to_back() {
        let mut rel = PeriodicRelease::new(0, 10);
        // 周期体跑到 t=25: 错过 10 和 20
        assert_eq!(rel.advance(25), Release::Overrun { release: 10, late_by: 15 });
        assert_eq!(rel.advance(25), Release::Overrun { release: 20, late_by: 5 });
        assert_eq!(rel.advance(26), Release::Sleep(30));
        assert_eq!(rel.last_release(), 30);
    }

    #[test]
    fn test_release_exactly_on_time() {
        let mut rel = PeriodicRelease::new(0, 20);
        assert_eq!(rel.advance(20), Release::Overrun { release: 20, late_by: 0 });
        assert!(!rel.is_due(39));
        assert!(rel.is_due(40));
    }

    #[test]
    fn test_release_across_tick_wrap() {
        let start = u32::MAX - 15;
        let mut rel = PeriodicRelease::new(start, 10);
        assert_eq!(rel.advance(start.wrapping_add(2)), Release::Sleep(start.wrapping_add(10)));
        assert_eq!(rel.advance(start.wrapping_add(12)), Release::Sleep(4));
        assert_eq!(rel.advance(7), Release::Sleep(14));
    }

    /// 每个周期体让时钟前进给定的 tick 数，并记录进入时刻
    struct Busy<'a> {
        id: TaskId,
        clock: &'a ManualClock,
        durations: &'a [Tick],
        entries: Vec<Tick>,
    }

    impl PeriodicTask for Busy<'_> {
        fn id(&self) -> TaskId {
            self.id
        }

        async fn run_period<const N: usize>(&mut self, _ctx: &MonitorContext<N>) {
            self.entries.push(self.clock.now());
            let d = self.durations[(self.entries.len() - 1) % self.durations.len()];
            self.clock.advance(d);
        }
    }

    #[test]
    fn test_nth_release_at_origin_plus_n_periods() {
        let clock = ManualClock::new(500);
        let ctx: MonitorContext<4> = MonitorContext::new();
        let mut task = Busy {
            id: TaskId::Load2Simulation,
            clock: &clock,
            durations: &[1, 30, 7, 99, 0],
            entries: Vec::new(),
        };
        let mut runner = PeriodicRunner::new(100, &clock);

        for _ in 0..10 {
            block_on(runner.cycle(&mut task, &ctx));
        }
        let expected: Vec<Tick> = (0..10).map(|n| 500 + n * 100).collect();
        assert_eq!(task.entries, expected);

        let snap = ctx.snapshot(clock.now());
        assert_eq!(snap.task(TaskId::Load2Simulation).releases, 10);
        assert_eq!(snap.task(TaskId::Load2Simulation).max_busy, 99);
        assert_eq!(snap.task(TaskId::Load2Simulation).overruns, 0);
    }

    #[test]
    fn test_overrunning_body_keeps_grid() {
        let clock = ManualClock::new(0);
        let ctx: MonitorContext<4> = MonitorContext::new();
        // 第一个周期体占 25 tick (周期 10)，之后都很短
        let mut task = Busy {
            id: TaskId::Load1Simulation,
            clock: &clock,
            durations: &[25, 1, 1, 1, 1],
            entries: Vec::new(),
        };
        let mut runner = PeriodicRunner::new(10, &clock);

        let first = block_on(runner.cycle(&mut task, &ctx));
        assert_eq!(first, Release::Overrun { release: 10, late_by: 15 });
        let second = block_on(runner.cycle(&mut task, &ctx));
        assert_eq!(second, Release::Overrun { release: 20, late_by: 6 });
        let third = block_on(runner.cycle(&mut task, &ctx));
        assert_eq!(third, Release::Sleep(30));
        block_on(runner.cycle(&mut task, &ctx));

        // 背靠背释放在 25、26，然后回到网格 30
        assert_eq!(task.entries, [0, 25, 26, 30]);
        assert_eq!(runner.release().last_release(), 40);
        assert_eq!(ctx.snapshot(clock.now()).task(TaskId::Load1Simulation).overruns, 2);
    }

    #[test]
    fn test_stats_follow_task_id() {
        let clock = ManualClock::new(0);
        let ctx: MonitorContext<4> = MonitorContext::new();
        let mut uart = Busy {
            id: TaskId::UartReceiver,
            clock: &clock,
            durations: &[3],
            entries: Vec::new(),
        };
        let mut runner = PeriodicRunner::new(20, &clock);
        block_on(runner.cycle(&mut uart, &ctx));
        block_on(runner.cycle(&mut uart, &ctx));

        let snap = ctx.snapshot(clock.now());
        assert_eq!(snap.task(TaskId::UartReceiver).releases, 2);
        assert_eq!(snap.task(TaskId::UartReceiver).busy_ticks, 6);
        for other in TaskId::ALL.into_iter().filter(|id| *id != TaskId::UartReceiver) {
            assert_eq!(snap.task(other).releases, 0);
        }
    }
}
