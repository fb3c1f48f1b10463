//! 任务标识与描述符
//!
//! 每个任务的类型由 `TaskId` 枚举在创建时确定，附在描述符上，
//! 不再通过单独的 "应用标签" 调用设置。

use super::clock::Tick;

/// 任务标识
///
/// 判别值就是任务标签 (1..=6)，统计与跟踪按它索引。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskId {
    /// 按键 1 边沿检测
    ButtonMonitor1 = 1,
    /// 按键 2 边沿检测
    ButtonMonitor2 = 2,
    /// 周期消息发送
    PeriodicTransmitter = 3,
    /// 队列排空到串口
    UartReceiver = 4,
    /// 负载模拟 1
    Load1Simulation = 5,
    /// 负载模拟 2
    Load2Simulation = 6,
}

impl TaskId {
    /// 任务数量
    pub const COUNT: usize = 6;

    /// 全部任务，按标签顺序
    pub const ALL: [TaskId; Self::COUNT] = [
        TaskId::ButtonMonitor1,
        TaskId::ButtonMonitor2,
        TaskId::PeriodicTransmitter,
        TaskId::UartReceiver,
        TaskId::Load1Simulation,
        TaskId::Load2Simulation,
    ];

    /// 任务标签
    #[inline(always)]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// 统计数组下标 (0 起)
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize - 1
    }

    /// 任务名
    pub const fn name(self) -> &'static str {
        match self {
            TaskId::ButtonMonitor1 => "Button_1_Monitor",
            TaskId::ButtonMonitor2 => "Button_2_Monitor",
            TaskId::PeriodicTransmitter => "Periodic_Transmitter",
            TaskId::UartReceiver => "Uart_Receiver",
            TaskId::Load1Simulation => "Load_1_Simulation",
            TaskId::Load2Simulation => "Load_2_Simulation",
        }
    }

    /// 由标签查找
    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.tag() == tag)
    }
}

/// 静态任务优先级 (数值越大越紧急)
///
/// 运行期不改变。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskPriority(pub u8);

impl TaskPriority {
    /// 空闲优先级 (不分配给任何任务)
    pub const IDLE: TaskPriority = TaskPriority(0);
    /// 低优先级 (周期发送、长负载)
    pub const LOW: TaskPriority = TaskPriority(1);
    /// 普通优先级 (按键采样)
    pub const NORMAL: TaskPriority = TaskPriority(2);
    /// 高优先级 (串口排空)
    pub const HIGH: TaskPriority = TaskPriority(3);
    /// 最高优先级 (短周期负载)
    pub const CRITICAL: TaskPriority = TaskPriority(4);
}

/// 任务描述符
///
/// 标识、周期、优先级与最近一次 *计划* 释放时刻。
/// 释放时刻序列是公差为 `period` 的等差数列。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub id: TaskId,
    pub period: Tick,
    pub priority: TaskPriority,
    pub last_release: Tick,
}

impl TaskDescriptor {
    pub const fn new(id: TaskId, period: Tick, priority: TaskPriority) -> Self {
        Self {
            id,
            period,
            priority,
            last_release: 0,
        }
    }

    /// 下一次计划释放时刻
    #[inline]
    pub const fn next_release(&self) -> Tick {
        self.last_release.wrapping_add(self.period)
    }
}
