//! CPU 负载模拟
//!
//! 每个周期忙等待 L 个 tick 前进，期间不让出处理器，
//! 用来在同优先级及更低优先级的任务上制造可预测的干扰。

use crate::context::MonitorContext;
use crate::sched::clock::{consume_ticks, Tick, TickSource};
use crate::sched::release::PeriodicTask;
use crate::sched::task::TaskId;

/// 每周期的负载预算
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadBudget {
    magnitude: u32,
    remaining: u32,
}

impl LoadBudget {
    pub const fn new(magnitude: u32) -> Self {
        Self {
            magnitude,
            remaining: magnitude,
        }
    }

    #[inline]
    pub fn magnitude(&self) -> u32 {
        self.magnitude
    }

    #[inline]
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// 消耗整份预算后复位，返回退出时观察到的 tick
    pub fn consume<C: TickSource + ?Sized>(&mut self, clock: &C) -> Tick {
        let exit = consume_ticks(clock, &mut self.remaining);
        self.remaining = self.magnitude;
        exit
    }
}

/// 负载模拟任务
pub struct LoadSimulator<C> {
    id: TaskId,
    budget: LoadBudget,
    clock: C,
}

impl<C: TickSource> LoadSimulator<C> {
    pub fn new(id: TaskId, magnitude: u32, clock: C) -> Self {
        Self {
            id,
            budget: LoadBudget::new(magnitude),
            clock,
        }
    }

    #[inline]
    pub fn budget(&self) -> &LoadBudget {
        &self.budget
    }
}

impl<C: TickSource> PeriodicTask for LoadSimulator<C> {
    fn id(&self) -> TaskId {
        self.id
    }

    async fn run_period<const N: usize>(&mut self, _ctx: &MonitorContext<N>) {
        self.budget.consume(&self.clock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LOAD_1_TICKS, LOAD_2_TICKS};
    use core::cell::Cell;
    use embassy_futures::block_on;

    /// 每读 `every` 次前进一个 tick
    struct SlowClock {
        reads: Cell<u32>,
        every: u32,
        start: Tick,
    }

    impl SlowClock {
        fn new(start: Tick, every: u32) -> Self {
            Self {
                reads: Cell::new(0),
                every,
                start,
            }
        }
    }

    impl TickSource for SlowClock {
        fn now(&self) -> Tick {
            let r = self.reads.get();
            self.reads.set(r + 1);
            self.start.wrapping_add(r / self.every)
        }
    }

    #[test]
    fn test_observes_exactly_l_advances() {
        let clock = SlowClock::new(100, 7);
        let mut budget = LoadBudget::new(LOAD_1_TICKS);
        let entry = clock.now();
        let exit = budget.consume(&clock);
        assert_eq!(exit.wrapping_sub(entry), LOAD_1_TICKS);
        assert_eq!(budget.remaining(), LOAD_1_TICKS);

        // 第二个周期同样是 L 个
        let entry = exit;
        let exit = budget.consume(&clock);
        assert_eq!(exit.wrapping_sub(entry), LOAD_1_TICKS);
    }

    #[test]
    fn test_counts_across_wrap() {
        let clock = SlowClock::new(u32::MAX - 3, 2);
        let mut budget = LoadBudget::new(LOAD_2_TICKS);
        let entry = clock.now();
        let exit = budget.consume(&clock);
        assert_eq!(exit.wrapping_sub(entry), LOAD_2_TICKS);
        assert_eq!(exit, LOAD_2_TICKS - 4);
    }

    #[test]
    fn test_simulator_period_resets_budget() {
        let ctx: MonitorContext<1> = MonitorContext::new();
        let clock = SlowClock::new(0, 3);
        let mut sim = LoadSimulator::new(TaskId::Load2Simulation, LOAD_2_TICKS, &clock);
        block_on(sim.run_period(&ctx));
        assert_eq!(sim.budget().remaining(), LOAD_2_TICKS);
        assert!(clock.now() >= LOAD_2_TICKS);
        assert_eq!(sim.id(), TaskId::Load2Simulation);
    }
}
