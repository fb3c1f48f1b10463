//! 错误类型
//!
//! 只有两类错误会以 `Result` 的形式出现:
//! - `QueueError`: 入队失败 (队列满 / 有界等待超时)，由任务自行吞掉
//! - `ConfigError`: 任务表配置错误，必须在调度开始前发现

use core::fmt;

use crate::sched::task::TaskId;

/// 消息队列错误
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// 零等待入队时队列已满
    Full,
    /// 有界等待期间队列一直没有空位
    Timeout,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueueError::Full => f.write_str("queue full"),
            QueueError::Timeout => f.write_str("queue send timed out"),
        }
    }
}

impl core::error::Error for QueueError {}

/// 启动期配置错误
///
/// 任何一个都是致命的: 固件在派生任务之前检查任务表，
/// 发现错误就记录日志并停机，不会带着错误配置进入调度。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// 任务表为空
    EmptyTable,
    /// 任务数超过调度表容量
    TooManyTasks,
    /// 周期为 0
    ZeroPeriod(TaskId),
    /// 同一任务出现两次
    DuplicateTask(TaskId),
    /// 每周期的 CPU 占用 (tick) 大于周期本身
    CostExceedsPeriod(TaskId),
    /// 边沿消息的有界等待不短于按键采样周期
    SendTimeoutTooLong,
}

impl ConfigError {
    /// 错误类别的短标签 (日志后端不支持 `Display` 时使用)
    pub const fn kind(&self) -> &'static str {
        match self {
            ConfigError::EmptyTable => "empty table",
            ConfigError::TooManyTasks => "too many tasks",
            ConfigError::ZeroPeriod(_) => "zero period",
            ConfigError::DuplicateTask(_) => "duplicate task",
            ConfigError::CostExceedsPeriod(_) => "cost exceeds period",
            ConfigError::SendTimeoutTooLong => "send timeout too long",
        }
    }

    /// 出错的任务 (如果错误针对单个任务)
    pub const fn task(&self) -> Option<TaskId> {
        match *self {
            ConfigError::ZeroPeriod(id)
            | ConfigError::DuplicateTask(id)
            | ConfigError::CostExceedsPeriod(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyTable => f.write_str("task table is empty"),
            ConfigError::TooManyTasks => f.write_str("task table exceeds scheduler capacity"),
            ConfigError::ZeroPeriod(id) => write!(f, "task {} has a zero period", id.name()),
            ConfigError::DuplicateTask(id) => write!(f, "task {} registered twice", id.name()),
            ConfigError::CostExceedsPeriod(id) => {
                write!(f, "task {} needs more ticks than its period", id.name())
            }
            ConfigError::SendTimeoutTooLong => {
                f.write_str("edge send timeout must be shorter than the button period")
            }
        }
    }
}

impl core::error::Error for ConfigError {}
