//! 帧状态与阶段

use std::fmt;

/// 传给每个阶段回调的帧状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateInfo {
    /// 本次回调对应的时间步长（秒）
    ///
    /// `fixed_update` 中等于固定步长，其余阶段为截断后的帧间隔。
    pub delta_time: f32,

    /// 帧序号，从 0 开始
    pub frame: u64,

    /// 固定步长（秒）
    pub fixed_timestep: f32,
}

impl StateInfo {
    pub fn new(delta_time: f32, frame: u64, fixed_timestep: f32) -> Self {
        Self {
            delta_time,
            frame,
            fixed_timestep,
        }
    }

    /// fixed_update 使用的状态
    pub fn fixed(&self) -> Self {
        Self {
            delta_time: self.fixed_timestep,
            ..*self
        }
    }
}

/// 每帧的执行阶段，按声明顺序执行
///
/// 同一阶段在所有存活组件上执行完毕后，才会进入下一阶段。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    EarlyUpdate,
    Update,
    LateUpdate,
    /// 每帧 0..n 次
    FixedUpdate,
    FrameCleanup,
}

impl Phase {
    /// 一帧内的阶段顺序
    pub const ORDER: [Phase; 5] = [
        Phase::EarlyUpdate,
        Phase::Update,
        Phase::LateUpdate,
        Phase::FixedUpdate,
        Phase::FrameCleanup,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Phase::EarlyUpdate => "early_update",
            Phase::Update => "update",
            Phase::LateUpdate => "late_update",
            Phase::FixedUpdate => "fixed_update",
            Phase::FrameCleanup => "frame_cleanup",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_state_uses_fixed_delta() {
        let state = StateInfo::new(0.033, 12, 0.016);
        let fixed = state.fixed();
        assert_eq!(fixed.delta_time, 0.016);
        assert_eq!(fixed.frame, 12);
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(Phase::ORDER[0], Phase::EarlyUpdate);
        assert_eq!(Phase::ORDER[4], Phase::FrameCleanup);
        assert_eq!(Phase::LateUpdate.to_string(), "late_update");
    }
}
