//! 单调 tick 时间基准
//!
//! 所有调度计算都以 `Tick` (1 tick = 1 ms) 为单位。tick 计数器按平台
//! 宽度 (u32) 回绕，因此比较一律使用回绕差值而不是 `<`/`>`。

use portable_atomic::{AtomicU32, Ordering};

/// 绝对 tick 计数
pub type Tick = u32;

/// 判断 `now` 是否已经到达 (或越过) `target`
///
/// 两者距离小于 2^31 tick 时在回绕后依然成立。
#[inline(always)]
pub const fn reached(now: Tick, target: Tick) -> bool {
    (now.wrapping_sub(target) as i32) >= 0
}

/// 单调 tick 源
pub trait TickSource {
    /// 当前 tick，非阻塞
    fn now(&self) -> Tick;
}

impl<T: TickSource + ?Sized> TickSource for &T {
    #[inline(always)]
    fn now(&self) -> Tick {
        (**self).now()
    }
}

/// 忙等待直到观察到 `countdown` 次 tick 前进
///
/// 每次循环比较 tick 值，只要和上一次观察到的不同就计为一次前进
/// (与差值大小无关，被抢占期间走过的多个 tick 也只算一次)。
/// 期间不让出处理器。返回退出时观察到的 tick，`countdown` 归零。
pub fn consume_ticks<C: TickSource + ?Sized>(clock: &C, countdown: &mut u32) -> Tick {
    let mut last = clock.now();
    while *countdown > 0 {
        let now = clock.now();
        if now != last {
            *countdown -= 1;
            last = now;
        } else {
            core::hint::spin_loop();
        }
    }
    last
}

// ===== 手动时钟: 主机侧仿真与测试 =====

/// 手动推进的时钟
///
/// 原子存储，可以在多个任务之间共享 `&ManualClock`。
/// `&ManualClock` 同时实现了 `ReleaseTimer`: 等待释放时直接跳到目标 tick。
pub struct ManualClock {
    ticks: AtomicU32,
}

impl ManualClock {
    pub const fn new(start: Tick) -> Self {
        Self {
            ticks: AtomicU32::new(start),
        }
    }

    /// 前进 `ticks` 个 tick
    #[inline]
    pub fn advance(&self, ticks: Tick) {
        self.ticks.fetch_add(ticks, Ordering::AcqRel);
    }

    /// 跳到 `target` (只向前，不回退)
    pub fn jump_to(&self, target: Tick) {
        let now = self.ticks.load(Ordering::Acquire);
        if !reached(now, target) {
            self.ticks.store(target, Ordering::Release);
        }
    }
}

impl TickSource for ManualClock {
    #[inline]
    fn now(&self) -> Tick {
        self.ticks.load(Ordering::Acquire)
    }
}

// ===== Embassy 时钟: 板级 =====

/// 基于 embassy-time 的 tick 源
///
/// `Instant` 的毫秒数截断到 32 位，与 `Tick` 同宽度回绕。
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbassyClock;

impl EmbassyClock {
    /// 把 32 位 tick 还原成 embassy 的 64 位时间点
    ///
    /// 以当前时刻为参照，`at` 可以在过去或将来 2^31 ms 以内。
    pub fn instant_at(at: Tick) -> embassy_time::Instant {
        let now_ms = embassy_time::Instant::now().as_millis();
        let delta = at.wrapping_sub(now_ms as Tick) as i32 as i64;
        let target = (now_ms as i64 + delta).max(0) as u64;
        embassy_time::Instant::from_millis(target)
    }
}

impl TickSource for EmbassyClock {
    #[inline]
    fn now(&self) -> Tick {
        embassy_time::Instant::now().as_millis() as Tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    /// 每被读取 `reads_per_tick` 次前进一个 tick
    struct SteppingClock {
        reads: Cell<u32>,
        reads_per_tick: u32,
        start: Tick,
    }

    impl TickSource for SteppingClock {
        fn now(&self) -> Tick {
            let reads = self.reads.get();
            self.reads.set(reads + 1);
            self.start.wrapping_add(reads / self.reads_per_tick)
        }
    }

    #[test]
    fn test_reached_handles_wrap() {
        assert!(reached(10, 10));
        assert!(reached(11, 10));
        assert!(!reached(9, 10));
        assert!(reached(3, u32::MAX - 2));
        assert!(!reached(u32::MAX - 2, 3));
    }

    #[test]
    fn test_consume_ticks_counts_observed_advances() {
        let clock = SteppingClock {
            reads: Cell::new(0),
            reads_per_tick: 4,
            start: 100,
        };
        let mut countdown = 5;
        let exit = consume_ticks(&clock, &mut countdown);
        assert_eq!(countdown, 0);
        assert_eq!(exit, 105);
    }

    #[test]
    fn test_consume_ticks_across_wrap() {
        let clock = SteppingClock {
            reads: Cell::new(0),
            reads_per_tick: 1,
            start: u32::MAX - 1,
        };
        let mut countdown = 3;
        assert_eq!(consume_ticks(&clock, &mut countdown), 1);
    }

    #[test]
    fn test_consume_zero_returns_immediately() {
        let clock = ManualClock::new(7);
        let mut countdown = 0;
        assert_eq!(consume_ticks(&clock, &mut countdown), 7);
    }

    #[test]
    fn test_manual_clock_only_moves_forward() {
        let clock = ManualClock::new(50);
        clock.jump_to(40);
        assert_eq!(clock.now(), 50);
        clock.jump_to(80);
        assert_eq!(clock.now(), 80);
        clock.advance(5);
        assert_eq!(clock.now(), 85);
    }
}
