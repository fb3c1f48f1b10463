//! 有界消息队列
//!
//! 多生产者 / 单消费者 FIFO，容量在编译期确定，永远不会增长。
//! 内部基于 `CriticalChannel`，所有访问都在临界区中完成，
//! 任务代码不接触队列内部。
//!
//! - `try_send`: 零等待入队，满则立即失败
//! - `send_within`: 有界等待入队，最多等待 `timeout` 个 tick
//! - `try_receive`: 零等待出队，空则返回 `None`
//!
//! 所有生产者共享一个全局到达顺序，出队顺序等于成功入队的顺序。

use embassy_futures::select::{select, Either};
use embedded_hal_async::delay::DelayNs;

use super::primitives::CriticalChannel;
use crate::error::QueueError;
use crate::message::Message;
use crate::sched::clock::Tick;

/// 固定容量的消息队列
pub struct MessageQueue<const N: usize> {
    channel: CriticalChannel<Message, N>,
}

impl<const N: usize> MessageQueue<N> {
    /// 创建空队列
    pub const fn new() -> Self {
        Self {
            channel: CriticalChannel::new(),
        }
    }

    /// 队列容量
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// 当前消息数量
    #[inline]
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    /// 零等待入队
    ///
    /// # Returns
    /// - `Ok(())`: 入队成功
    /// - `Err(QueueError::Full)`: 队列已满，消息未入队
    pub fn try_send(&self, msg: Message) -> Result<(), QueueError> {
        self.channel.try_send(msg).map_err(|_| QueueError::Full)
    }

    /// 有界等待入队
    ///
    /// 队列满时挂起当前任务，直到有空位或 `timeout` 个 tick 过去。
    /// 超时后消息被放弃 (不重试)。`timeout == 0` 等价于 `try_send`。
    ///
    /// 两个 future 同时就绪时入队优先。超时分支被选中时发送 future
    /// 被丢弃，消息不会在之后 "迟到" 入队。
    pub async fn send_within<D: DelayNs>(
        &self,
        msg: Message,
        timeout: Tick,
        delay: &mut D,
    ) -> Result<(), QueueError> {
        if timeout == 0 {
            return self.try_send(msg);
        }
        // 快路径: 有空位就不必启动定时器
        if self.try_send(msg).is_ok() {
            return Ok(());
        }
        match select(self.channel.send(msg), delay.delay_ms(timeout)).await {
            Either::First(()) => Ok(()),
            Either::Second(()) => Err(QueueError::Timeout),
        }
    }

    /// 零等待出队
    #[inline]
    pub fn try_receive(&self) -> Option<Message> {
        self.channel.try_receive().ok()
    }
}

impl<const N: usize> Default for MessageQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Message, BUTTON_1_RISING, PERIODIC};
    use embassy_futures::{block_on, join::join, yield_now};

    static X: Message = Message::new("x");
    static Y: Message = Message::new("y");
    static Z: Message = Message::new("z");

    /// 立即到期的延时: 有界等待等价于 "检查一次后超时"
    struct Expired;

    impl DelayNs for Expired {
        async fn delay_ns(&mut self, _ns: u32) {}
    }

    /// 让出若干次后到期的延时
    struct Yields(usize);

    impl DelayNs for Yields {
        async fn delay_ns(&mut self, _ns: u32) {
            for _ in 0..self.0 {
                yield_now().await;
            }
        }
    }

    #[test]
    fn test_capacity_two_scenario() {
        let queue: MessageQueue<2> = MessageQueue::new();

        // 生产者 A
        assert_eq!(queue.try_send(X), Ok(()));
        assert_eq!(queue.try_send(Y), Ok(()));

        // 生产者 B: 零等待，队列满
        assert_eq!(queue.try_send(Z), Err(QueueError::Full));
        assert_eq!(queue.len(), 2);

        // 消费者
        assert_eq!(queue.try_receive(), Some(X));
        assert_eq!(queue.try_receive(), Some(Y));
        assert_eq!(queue.try_receive(), None);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        let queue: MessageQueue<50> = MessageQueue::new();
        let mut accepted = 0;
        for _ in 0..80 {
            if queue.try_send(PERIODIC).is_ok() {
                accepted += 1;
            }
            assert!(queue.len() <= queue.capacity());
        }
        assert_eq!(accepted, 50);
        assert!(queue.is_full());
    }

    #[test]
    fn test_fifo_across_producers() {
        let queue: MessageQueue<8> = MessageQueue::new();
        let order = [X, BUTTON_1_RISING, Y, PERIODIC, Z];
        for msg in order {
            queue.try_send(msg).unwrap();
        }
        for expected in order {
            assert_eq!(queue.try_receive(), Some(expected));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_bounded_wait_times_out_on_full_queue() {
        let queue: MessageQueue<1> = MessageQueue::new();
        queue.try_send(X).unwrap();

        let result = block_on(queue.send_within(Y, 10, &mut Expired));
        assert_eq!(result, Err(QueueError::Timeout));
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.try_receive(), Some(X));
        // 超时的消息不会迟到入队
        assert_eq!(queue.try_receive(), None);
    }

    #[test]
    fn test_bounded_wait_succeeds_when_space_frees() {
        let queue: MessageQueue<1> = MessageQueue::new();
        queue.try_send(X).unwrap();

        let (sent, received) = block_on(join(
            queue.send_within(Y, 10, &mut Yields(4)),
            async { queue.try_receive() },
        ));
        assert_eq!(sent, Ok(()));
        assert_eq!(received, Some(X));
        assert_eq!(queue.try_receive(), Some(Y));
    }

    #[test]
    fn test_zero_timeout_is_try_send() {
        let queue: MessageQueue<1> = MessageQueue::new();
        queue.try_send(X).unwrap();
        let result = block_on(queue.send_within(Y, 0, &mut Yields(100)));
        assert_eq!(result, Err(QueueError::Full));
    }

    #[test]
    fn test_bounded_wait_fast_path() {
        let queue: MessageQueue<2> = MessageQueue::new();
        assert_eq!(block_on(queue.send_within(X, 10, &mut Expired)), Ok(()));
        assert_eq!(queue.try_receive(), Some(X));
    }
}
