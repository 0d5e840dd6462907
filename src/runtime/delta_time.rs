//! 帧间隔采样
//!
//! ```text
//! Uninitialized --update()--> Running   首次采样只记录时间戳，帧间隔为 0
//! Running       --update()--> Running   间隔 = now - last，截断到 max_delta
//! ```
//!
//! `get()` 在两次 `update()` 之间是幂等的。

use std::time::Duration;

use super::{Clock, MonotonicClock};
use crate::engine_warn;

/// 默认的最大帧间隔（秒），防止卡顿后出现破坏游戏逻辑的巨大步长
pub const MAX_DT: f32 = 1.0;

/// 每帧时间状态
#[derive(Debug)]
pub struct DeltaTime<C = MonotonicClock> {
    clock: C,
    last: Option<u64>,
    delta: Duration,
    max_delta: Duration,
}

impl<C: Clock> DeltaTime<C> {
    /// 使用默认的最大帧间隔
    pub fn new(clock: C) -> Self {
        Self::with_max_delta(clock, MAX_DT)
    }

    /// 指定最大帧间隔（秒）
    ///
    /// 非正数或无法表示为时长的值回退到 [`MAX_DT`]。
    pub fn with_max_delta(clock: C, max_delta: f32) -> Self {
        let max_delta = match Duration::try_from_secs_f32(max_delta) {
            Ok(max) if !max.is_zero() => max,
            _ => {
                engine_warn!(max_delta, fallback = MAX_DT, "Invalid maximum frame delta");
                Duration::from_secs_f32(MAX_DT)
            }
        };

        Self {
            clock,
            last: None,
            delta: Duration::ZERO,
            max_delta,
        }
    }

    /// 采样时钟，推进状态，返回新的帧间隔（秒）
    ///
    /// 每帧开始时调用一次。
    pub fn update(&mut self) -> f32 {
        let now = self.clock.now_ns();

        self.delta = match self.last {
            None => Duration::ZERO,
            Some(last) => {
                let raw = Duration::from_nanos(now.saturating_sub(last));
                if raw > self.max_delta {
                    tracing::debug!(
                        raw_ms = raw.as_millis() as u64,
                        max_ms = self.max_delta.as_millis() as u64,
                        "Frame delta clamped"
                    );
                    self.max_delta
                } else {
                    raw
                }
            }
        };

        self.last = Some(now);
        self.get()
    }

    /// 当前帧间隔（秒）
    pub fn get(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// 当前帧间隔
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// 是否已经完成首次采样
    pub fn is_running(&self) -> bool {
        self.last.is_some()
    }

    pub fn max_delta(&self) -> Duration {
        self.max_delta
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
