//! 运行时模块
//!
//! 帧时间采样、固定步长累加以及按阶段驱动场景中全部组件的场景驱动。
//! 时钟通过 [`Clock`] 注入，测试中使用 [`ManualClock`] 精确推进时间。

mod clock;
mod delta_time;
mod fixed_step;
mod scene;
mod state;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use delta_time::{DeltaTime, MAX_DT};
pub use fixed_step::FixedStep;
pub use scene::{ActivationReport, FrameStats, Scene};
pub use state::{Phase, StateInfo};
