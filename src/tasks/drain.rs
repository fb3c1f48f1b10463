//! 队列消费者
//!
//! 每个周期零等待出队一次；拿到消息就把负载写到输出汇点，
//! 单次写入最多 `MAX_WRITE_LEN` 字节 (更长的负载被截断)。
//! 汇点只接受一部分字节时继续写剩余部分，整段写完才算转发成功。
//! 队列空时什么也不做。

use embedded_io::Write;

use crate::config::MAX_WRITE_LEN;
use crate::context::MonitorContext;
use crate::sched::release::PeriodicTask;
use crate::sched::task::TaskId;
use crate::util::log::*;

pub struct QueueDrain<S> {
    sink: S,
}

impl<S: Write> QueueDrain<S> {
    pub const fn new(sink: S) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }
}

impl<S: Write> PeriodicTask for QueueDrain<S> {
    fn id(&self) -> TaskId {
        TaskId::UartReceiver
    }

    async fn run_period<const N: usize>(&mut self, ctx: &MonitorContext<N>) {
        let Some(msg) = ctx.queue().try_receive() else {
            return;
        };
        let bytes = msg.bytes();
        let len = bytes.len().min(MAX_WRITE_LEN);
        // 驱动可能只接受一部分 (串口 FIFO 满)，write_all 会写完剩余部分
        match self.sink.write_all(&bytes[..len]) {
            Ok(()) => ctx.stats().record_forwarded(),
            Err(_) => {
                ctx.stats().record_sink_error();
                log_warn!("output write failed, {} bytes lost", len);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, BUTTON_1_FALLING, PERIODIC};
    use embassy_futures::block_on;
    use embedded_io::{ErrorKind, ErrorType};
    use std::vec::Vec;

    /// 记录写出字节的汇点，`chunk` 限制每次调用接受的字节数
    #[derive(Default)]
    struct Recorder {
        out: Vec<u8>,
        calls: usize,
        chunk: Option<usize>,
        fail: bool,
    }

    impl ErrorType for Recorder {
        type Error = ErrorKind;
    }

    impl Write for Recorder {
        fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
            if self.fail {
                return Err(ErrorKind::Other);
            }
            self.calls += 1;
            let n = self.chunk.map_or(buf.len(), |c| c.min(buf.len()));
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    static LONG: Message = Message::new("this payload is longer than twenty bytes\n");

    #[test]
    fn test_forwards_one_message_per_period() {
        let ctx: MonitorContext<4> = MonitorContext::new();
        ctx.queue().try_send(PERIODIC).unwrap();
        ctx.queue().try_send(BUTTON_1_FALLING).unwrap();
        let mut drain = QueueDrain::new(Recorder::default());

        block_on(drain.run_period(&ctx));
        assert_eq!(drain.sink().out, b"Periodic Message\n");
        assert_eq!(ctx.queue().len(), 1);
        block_on(drain.run_period(&ctx));

        assert_eq!(drain.sink().out, b"Periodic Message\nButton 1 Falling\n");
        assert_eq!(drain.sink().calls, 2);
        assert_eq!(ctx.snapshot(0).forwarded, 2);
    }

    #[test]
    fn test_partial_writes_complete_payload() {
        let ctx: MonitorContext<4> = MonitorContext::new();
        ctx.queue().try_send(PERIODIC).unwrap();
        let mut drain = QueueDrain::new(Recorder {
            chunk: Some(4),
            ..Default::default()
        });
        block_on(drain.run_period(&ctx));

        // 17 字节分 5 次写完
        assert_eq!(drain.sink().out, PERIODIC.bytes());
        assert_eq!(drain.sink().calls, 5);
        let snap = ctx.snapshot(0);
        assert_eq!(snap.forwarded, 1);
        assert_eq!(snap.sink_errors, 0);
    }

    #[test]
    fn test_empty_queue_is_noop() {
        let ctx: MonitorContext<4> = MonitorContext::new();
        let mut drain = QueueDrain::new(Recorder::default());
        block_on(drain.run_period(&ctx));
        assert!(drain.sink().out.is_empty());
        assert_eq!(drain.sink().calls, 0);
        assert_eq!(ctx.snapshot(0).forwarded, 0);
    }

    #[test]
    fn test_long_payload_truncated() {
        let ctx: MonitorContext<4> = MonitorContext::new();
        ctx.queue().try_send(LONG).unwrap();
        let mut drain = QueueDrain::new(Recorder {
            chunk: Some(8),
            ..Default::default()
        });
        block_on(drain.run_period(&ctx));
        assert_eq!(drain.sink().out.len(), MAX_WRITE_LEN);
        assert_eq!(drain.sink().out, &LONG.bytes()[..MAX_WRITE_LEN]);
    }

    #[test]
    fn test_sink_error_counted_not_retried() {
        let ctx: MonitorContext<4> = MonitorContext::new();
        ctx.queue().try_send(PERIODIC).unwrap();
        let mut drain = QueueDrain::new(Recorder {
            fail: true,
            ..Default::default()
        });
        block_on(drain.run_period(&ctx));
        let snap = ctx.snapshot(0);
        assert_eq!(snap.sink_errors, 1);
        assert_eq!(snap.forwarded, 0);
        assert!(ctx.queue().is_empty());
    }
}
