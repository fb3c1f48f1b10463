//! 调度模块
//!
//! - `clock`: 单调 tick 时间基准与忙等待原语
//! - `task`: 任务标识、优先级与描述符
//! - `release`: 周期释放 (delay-until 语义) 与任务运行器
//! - `scheduler`: 任务表校验与确定性的抢占式分派模型
//! - `stats`: 运行时统计与 CPU 负载

pub mod clock;
pub mod task;
pub mod release;
pub mod scheduler;
pub mod stats;
