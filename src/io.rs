//! 外部 I/O 契约
//!
//! 本库只消费驱动的读写契约:
//! - 数字输入: `embedded_hal::digital::InputPin`，读取为 `PinLevel`
//! - 输出: `embedded_io::Write`，由队列消费者以 `write_all` 写出整段负载

use embedded_hal::digital::InputPin;

/// 引脚电平
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinLevel {
    Low,
    High,
}

impl From<bool> for PinLevel {
    #[inline(always)]
    fn from(high: bool) -> Self {
        if high {
            PinLevel::High
        } else {
            PinLevel::Low
        }
    }
}

/// 边沿事件
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// LOW → HIGH
    Rising,
    /// HIGH → LOW
    Falling,
}

/// 采样一次数字输入 (非阻塞)
#[inline]
pub fn sample<P: InputPin>(pin: &mut P) -> Result<PinLevel, P::Error> {
    pin.is_high().map(PinLevel::from)
}
