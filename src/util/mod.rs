//! 通用工具
//!
//! - `log`: 条件编译日志宏

pub mod log;
