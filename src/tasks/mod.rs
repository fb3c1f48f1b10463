//! 周期任务
//!
//! 每个任务实现 `PeriodicTask`，由 `PeriodicRunner` 按周期驱动:
//! - `edge`: 按键边沿检测 (生产者，有界等待入队)
//! - `transmitter`: 周期消息 (生产者，零等待入队)
//! - `load`: CPU 负载模拟 (忙等待)
//! - `drain`: 队列消费者，写到输出汇点

pub mod edge;
pub mod transmitter;
pub mod load;
pub mod drain;

pub use drain::QueueDrain;
pub use edge::{ButtonMonitor, EdgeDetector};
pub use load::{LoadBudget, LoadSimulator};
pub use transmitter::PeriodicTransmitter;
