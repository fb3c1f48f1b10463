//! 消息与静态负载池
//!
//! 队列里流动的只是对静态字符串的引用: 不拷贝、不分配、不释放。
//! 两条消息相等当且仅当它们指向同一个负载 (地址与长度都相同)，
//! 内容相同但来源不同的字符串不算同一条消息。

use core::fmt;

use crate::io::Edge;

/// 对静态文本负载的不可变引用
#[derive(Clone, Copy)]
pub struct Message(&'static str);

impl Message {
    pub const fn new(payload: &'static str) -> Self {
        Self(payload)
    }

    /// 文本负载
    #[inline(always)]
    pub const fn text(&self) -> &'static str {
        self.0
    }

    /// 负载字节
    #[inline(always)]
    pub const fn bytes(&self) -> &'static [u8] {
        self.0.as_bytes()
    }

    /// 是否为同一个负载 (身份比较)
    #[inline(always)]
    pub fn same_payload(&self, other: &Message) -> bool {
        core::ptr::eq(self.0, other.0)
    }
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.same_payload(other)
    }
}

impl Eq for Message {}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Message").field(&self.0).finish()
    }
}

// ===== 静态负载池 =====

pub static BUTTON_1_RISING: Message = Message::new("Button 1 Rising\n");
pub static BUTTON_1_FALLING: Message = Message::new("Button 1 Falling\n");
pub static BUTTON_2_RISING: Message = Message::new("Button 2 Rising\n");
pub static BUTTON_2_FALLING: Message = Message::new("Button 2 Falling\n");
pub static PERIODIC: Message = Message::new("Periodic Message\n");

/// 被监视的按键
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    One,
    Two,
}

impl Button {
    /// 该按键对应的边沿消息
    pub fn edge_message(self, edge: Edge) -> Message {
        match (self, edge) {
            (Button::One, Edge::Rising) => BUTTON_1_RISING,
            (Button::One, Edge::Falling) => BUTTON_1_FALLING,
            (Button::Two, Edge::Rising) => BUTTON_2_RISING,
            (Button::Two, Edge::Falling) => BUTTON_2_FALLING,
        }
    }
}
