//! edgemon - ESP32-S3 输入监视器的调度与消息核心
//!
//! 本库提供以下核心功能:
//! - 周期释放调度 (基于绝对时间基准，无漂移)
//! - 有界多生产者/单消费者消息队列 (基于 embassy-sync)
//! - 两态边沿检测状态机
//! - 确定性的 CPU 负载模拟
//!
//! 硬件相关部分 (GPIO/UART 驱动、执行器启动) 位于 `main.rs`，
//! 仅在 `board` feature 下构建；库本身可在主机上测试。

#![cfg_attr(not(test), no_std)]

pub mod util;
pub mod config;
pub mod error;
pub mod message;
pub mod io;
pub mod sync;
pub mod sched;
pub mod context;
pub mod tasks;

// ===== 重导出常用类型 =====
pub use config::TASK_TABLE;
pub use context::MonitorContext;
pub use error::{ConfigError, QueueError};
pub use message::Message;
pub use sched::clock::{Tick, TickSource};
pub use sched::release::{PeriodicRelease, PeriodicRunner, PeriodicTask, Release, ReleaseTimer};
pub use sched::scheduler::{DispatchPolicy, Scheduler};
pub use sched::task::{TaskId, TaskPriority};
pub use sync::queue::MessageQueue;

// ===== 版本信息 =====
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
