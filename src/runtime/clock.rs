//! 时钟源
//!
//! 帧节奏逻辑只消费单调时钟的读数（纳秒），时钟通过注入提供，
//! 测试中可以用 [`ManualClock`] 精确控制时间。

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// 单调时钟
pub trait Clock {
    /// 当前时间（纳秒），只保证单调，不对应墙上时间
    fn now_ns(&self) -> u64;
}

/// 基于 `std::time::Instant` 的单调时钟
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

/// 手动推进的时钟
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置绝对时间
    pub fn set(&self, time: Duration) {
        self.now.set(time.as_nanos() as u64);
    }

    /// 向前推进
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta.as_nanos() as u64);
    }
}

impl Clock for ManualClock {
    fn now_ns(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for Rc<C> {
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}
