//! 按键边沿检测
//!
//! 轮询式两态自动机 {LOW, HIGH}，初始为 LOW:
//! LOW→HIGH 发出 RISING，HIGH→LOW 发出 FALLING，自转移不发出任何消息。
//! 周期内的抖动 (在两次采样之间来回跳变) 不可见。

use embedded_hal::digital::InputPin;
use embedded_hal_async::delay::DelayNs;

use crate::config::EDGE_SEND_TIMEOUT;
use crate::context::MonitorContext;
use crate::io::{self, Edge, PinLevel};
use crate::message::Button;
use crate::sched::clock::Tick;
use crate::sched::release::PeriodicTask;
use crate::sched::task::TaskId;
use crate::util::log::*;

/// 两态边沿检测器
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeDetector {
    previous: PinLevel,
}

impl EdgeDetector {
    pub const fn new() -> Self {
        Self {
            previous: PinLevel::Low,
        }
    }

    #[inline]
    pub fn previous(&self) -> PinLevel {
        self.previous
    }

    /// 输入一次采样，返回检测到的边沿
    pub fn sample(&mut self, current: PinLevel) -> Option<Edge> {
        let edge = match (self.previous, current) {
            (PinLevel::Low, PinLevel::High) => Some(Edge::Rising),
            (PinLevel::High, PinLevel::Low) => Some(Edge::Falling),
            _ => None,
        };
        self.previous = current;
        edge
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个按键的监视任务
///
/// 每个周期采样一次引脚，检测到边沿时以有界等待方式入队。
/// 超时的消息直接丢弃，不重试；读引脚出错则跳过本周期，状态不变。
pub struct ButtonMonitor<P, D> {
    button: Button,
    pin: P,
    delay: D,
    detector: EdgeDetector,
    timeout: Tick,
}

impl<P: InputPin, D: DelayNs> ButtonMonitor<P, D> {
    pub fn new(button: Button, pin: P, delay: D) -> Self {
        Self {
            button,
            pin,
            delay,
            detector: EdgeDetector::new(),
            timeout: EDGE_SEND_TIMEOUT,
        }
    }

    #[inline]
    pub fn detector(&self) -> &EdgeDetector {
        &self.detector
    }
}

impl<P: InputPin, D: DelayNs> PeriodicTask for ButtonMonitor<P, D> {
    fn id(&self) -> TaskId {
        match self.button {
            Button::One => TaskId::ButtonMonitor1,
            Button::Two => TaskId::ButtonMonitor2,
        }
    }

    async fn run_period<const N: usize>(&mut self, ctx: &MonitorContext<N>) {
        let id = self.id();
        let level = match io::sample(&mut self.pin) {
            Ok(level) => level,
            Err(_) => {
                ctx.stats().record_pin_error();
                log_warn!("{}: pin read failed, period skipped", id.name());
                return;
            }
        };

        let Some(edge) = self.detector.sample(level) else {
            return;
        };
        let msg = self.button.edge_message(edge);
        match ctx.queue().send_within(msg, self.timeout, &mut self.delay).await {
            Ok(()) => ctx.stats().record_sent(id),
            Err(_) => {
                ctx.stats().record_dropped(id);
                log_debug!("{}: queue full, edge dropped", id.name());
            }
        }
    }
}
