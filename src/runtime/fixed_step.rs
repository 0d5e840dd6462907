//! 固定步长累加器
//!
//! 每帧把帧间隔累加进来，按固定步长切出 0..n 次 fixed_update。
//! 单帧步数有上限，超出部分直接丢弃，避免卡顿后出现“死亡螺旋”。

use std::time::Duration;

/// 固定步长累加器
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
    max_steps: u32,
}

impl FixedStep {
    pub fn new(step: Duration, max_steps: u32) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_steps,
        }
    }

    /// 累加帧间隔，返回本帧应执行的 fixed_update 次数
    pub fn accumulate(&mut self, delta: Duration) -> u32 {
        if self.step.is_zero() {
            return 0;
        }

        self.accumulator += delta;

        let mut steps = 0;
        while self.accumulator >= self.step && steps < self.max_steps {
            self.accumulator -= self.step;
            steps += 1;
        }

        if self.accumulator >= self.step {
            let dropped = self.accumulator.as_nanos() / self.step.as_nanos();
            tracing::warn!(
                max_steps = self.max_steps,
                dropped = dropped as u64,
                "Fixed step budget exceeded, dropping accumulated time"
            );
            self.accumulator = Duration::from_nanos(
                (self.accumulator.as_nanos() % self.step.as_nanos()) as u64,
            );
        }

        steps
    }

    /// 固定步长
    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }

    /// 尚未消耗的累积时间
    pub fn remainder(&self) -> Duration {
        self.accumulator
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_accumulates_partial_frames() {
        let mut fixed = FixedStep::new(ms(16), 64);

        assert_eq!(fixed.accumulate(ms(10)), 0);
        assert_eq!(fixed.accumulate(ms(10)), 1);
        assert_eq!(fixed.remainder(), ms(4));
        assert_eq!(fixed.accumulate(ms(28)), 2);
        assert_eq!(fixed.remainder(), ms(0));
    }

    #[test]
    fn test_zero_delta_runs_nothing() {
        let mut fixed = FixedStep::new(ms(16), 64);
        assert_eq!(fixed.accumulate(Duration::ZERO), 0);
    }

    #[test]
    fn test_step_cap_drops_excess() {
        let mut fixed = FixedStep::new(ms(10), 3);

        assert_eq!(fixed.accumulate(ms(105)), 3);
        // 多出来的整步被丢弃，只保留不足一步的部分
        assert_eq!(fixed.remainder(), ms(5));
        assert_eq!(fixed.accumulate(ms(5)), 1);
    }

    #[test]
    fn test_zero_step_is_disabled() {
        let mut fixed = FixedStep::new(Duration::ZERO, 8);
        assert_eq!(fixed.accumulate(ms(100)), 0);
    }
}
