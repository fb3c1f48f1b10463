//! 周期消息发送
//!
//! 每个周期零等待入队一条固定消息；队列满则丢弃，不重试也不缓存。

use crate::context::MonitorContext;
use crate::message::{Message, PERIODIC};
use crate::sched::release::PeriodicTask;
use crate::sched::task::TaskId;
use crate::util::log::*;

pub struct PeriodicTransmitter {
    message: Message,
}

impl PeriodicTransmitter {
    pub const fn new() -> Self {
        Self { message: PERIODIC }
    }
}

impl Default for PeriodicTransmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodicTask for PeriodicTransmitter {
    fn id(&self) -> TaskId {
        TaskId::PeriodicTransmitter
    }

    async fn run_period<const N: usize>(&mut self, ctx: &MonitorContext<N>) {
        match ctx.queue().try_send(self.message) {
            Ok(()) => ctx.stats().record_sent(TaskId::PeriodicTransmitter),
            Err(_) => {
                ctx.stats().record_dropped(TaskId::PeriodicTransmitter);
                log_trace!("periodic message dropped");
            }
        }
    }
}
