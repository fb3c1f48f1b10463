//! 系统配置常量
//!
//! 所有周期、负载量与队列容量都在编译期确定。
//! 任务表在派生任何任务之前由 `validate` 检查。

use crate::error::ConfigError;
use crate::sched::clock::Tick;
use crate::sched::task::{TaskId, TaskPriority};

/// 调度表容量
pub const MAX_TASKS: usize = 8;

/// 共享消息队列容量
pub const QUEUE_CAPACITY: usize = 50;

/// 单次串口写出的最大字节数
pub const MAX_WRITE_LEN: usize = 20;

// ===== 任务周期 (tick) =====

pub const BUTTON_1_PERIOD: Tick = 50;
pub const BUTTON_2_PERIOD: Tick = 50;
pub const TRANSMITTER_PERIOD: Tick = 100;
pub const UART_RECEIVER_PERIOD: Tick = 20;
pub const LOAD_1_PERIOD: Tick = 10;
pub const LOAD_2_PERIOD: Tick = 100;

// ===== 负载模拟 =====

/// 负载 1 每周期占用的 tick 数
pub const LOAD_1_TICKS: u32 = 5;
/// 负载 2 每周期占用的 tick 数
pub const LOAD_2_TICKS: u32 = 12;

// ===== 入队等待 =====

/// 边沿消息的有界等待 (tick)，周期消息不等待
pub const EDGE_SEND_TIMEOUT: Tick = 10;

/// 任务表项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskConfig {
    pub id: TaskId,
    pub period: Tick,
    pub priority: TaskPriority,
    /// 每周期占用处理器的 tick 数 (用于可调度性分析)，不足 1 tick 的记为 0
    pub cost: Tick,
}

impl TaskConfig {
    pub const fn new(id: TaskId, period: Tick, priority: TaskPriority, cost: Tick) -> Self {
        Self {
            id,
            period,
            priority,
            cost,
        }
    }
}

/// 静态任务表
///
/// 优先级按速率单调分配: 周期越短优先级越高。
pub const TASK_TABLE: [TaskConfig; TaskId::COUNT] = [
    TaskConfig::new(TaskId::ButtonMonitor1, BUTTON_1_PERIOD, TaskPriority::NORMAL, 0),
    TaskConfig::new(TaskId::ButtonMonitor2, BUTTON_2_PERIOD, TaskPriority::NORMAL, 0),
    TaskConfig::new(TaskId::PeriodicTransmitter, TRANSMITTER_PERIOD, TaskPriority::LOW, 0),
    TaskConfig::new(TaskId::UartReceiver, UART_RECEIVER_PERIOD, TaskPriority::HIGH, 0),
    TaskConfig::new(TaskId::Load1Simulation, LOAD_1_PERIOD, TaskPriority::CRITICAL, LOAD_1_TICKS),
    TaskConfig::new(TaskId::Load2Simulation, LOAD_2_PERIOD, TaskPriority::LOW, LOAD_2_TICKS),
];

/// 查找任务配置
pub fn task_config(id: TaskId) -> Option<&'static TaskConfig> {
    TASK_TABLE.iter().find(|c| c.id == id)
}

/// 检查任务表
///
/// 任何错误都应在调度开始前报告，而不是运行期才暴露。
pub fn validate(table: &[TaskConfig]) -> Result<(), ConfigError> {
    if table.is_empty() {
        return Err(ConfigError::EmptyTable);
    }
    if table.len() > MAX_TASKS {
        return Err(ConfigError::TooManyTasks);
    }
    for (i, cfg) in table.iter().enumerate() {
        if cfg.period == 0 {
            return Err(ConfigError::ZeroPeriod(cfg.id));
        }
        if cfg.cost > cfg.period {
            return Err(ConfigError::CostExceedsPeriod(cfg.id));
        }
        if table[..i].iter().any(|other| other.id == cfg.id) {
            return Err(ConfigError::DuplicateTask(cfg.id));
        }
        let is_button = matches!(cfg.id, TaskId::ButtonMonitor1 | TaskId::ButtonMonitor2);
        if is_button && EDGE_SEND_TIMEOUT >= cfg.period {
            return Err(ConfigError::SendTimeoutTooLong);
        }
    }
    Ok(())
}

/// 中断执行器优先级档位
///
/// 0 表示线程模式执行器 (最低)，1..=3 对应软件中断优先级。
/// 同一档位内的任务协作运行，高档位执行器抢占低档位。
pub const fn executor_level(priority: TaskPriority) -> u8 {
    match priority.0 {
        0 | 1 => 0,
        2 => 1,
        3 => 2,
        _ => 3,
    }
}
