//! 同步原语模块
//!
//! 提供任务间共享的同步原语，基于 embassy-sync 与 portable-atomic 封装:
//! - `CriticalChannel`: 有界 MPMC 通道 (消息队列的底层存储)
//! - `AtomicCounter` / `AtomicMax`: 无锁统计计数
//! - `MessageQueue`: 监视器的共享消息队列

pub mod primitives;
pub mod queue;

pub use primitives::{AtomicCounter, AtomicMax, CriticalChannel};
pub use queue::MessageQueue;
