//! 场景驱动
//!
//! 场景拥有全部游戏对象，负责：
//!
//! - 在第一帧之前（以及之后新加入对象时）激活待处理的对象
//! - 每帧采样一次帧间隔，并按阶段广度优先地驱动所有存活组件
//!
//! 一帧内的执行顺序：
//!
//! ```text
//! early_update(全部对象) -> update(全部对象) -> late_update(全部对象)
//!   -> fixed_update(全部对象) x n -> frame_cleanup(全部对象)
//! ```
//!
//! 对象之间按加入场景的顺序，对象内部按依赖解析后的顺序。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use super::{Clock, DeltaTime, FixedStep, MonotonicClock, Phase, StateInfo};
use crate::component::{Component, GameObject, ObjectId, ObjectState};
use crate::core::config::TimeConfig;
use crate::core::error::{DistSceneError, MisuseError, Result};
use crate::core::scene::SceneConfig;
use crate::{engine_error, engine_info, engine_warn};

/// 一次激活遍历的结果
#[derive(Debug, Default)]
pub struct ActivationReport {
    /// 成功激活的对象
    pub activated: Vec<ObjectId>,
    /// 激活失败的对象及原因
    pub failed: Vec<(ObjectId, DistSceneError)>,
}

impl ActivationReport {
    /// 是否没有任何失败
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.activated.is_empty() && self.failed.is_empty()
    }
}

/// 单帧统计
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// 帧序号
    pub frame: u64,
    /// 截断后的帧间隔（秒）
    pub delta_time: f32,
    /// 本帧执行的 fixed_update 次数
    pub fixed_steps: u32,
    /// 参与本帧的对象数
    pub active_objects: usize,
    /// 参与本帧的组件数
    pub components: usize,
}

/// 场景
pub struct Scene<C: Clock = MonotonicClock> {
    name: String,
    objects: Vec<GameObject>,
    delta_time: DeltaTime<C>,
    fixed_step: FixedStep,
    frame: u64,
    elapsed: Duration,
}

impl Scene<MonotonicClock> {
    /// 使用系统单调时钟创建场景
    pub fn new(name: impl Into<String>, config: &TimeConfig) -> Self {
        Self::with_clock(name, config, MonotonicClock::new())
    }
}

impl<C: Clock> Scene<C> {
    /// 使用指定时钟创建场景
    pub fn with_clock(name: impl Into<String>, config: &TimeConfig, clock: C) -> Self {
        Self {
            name: name.into(),
            objects: Vec::new(),
            delta_time: DeltaTime::with_max_delta(clock, config.max_delta),
            fixed_step: FixedStep::new(
                Duration::from_millis(config.fixed_timestep_ms),
                config.max_fixed_steps,
            ),
            frame: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// 按场景描述构建场景，对象保持待激活状态
    pub fn from_config(description: &SceneConfig, config: &TimeConfig, clock: C) -> Self {
        let mut scene = Self::with_clock(description.name.clone(), config, clock);
        for object in description.build_objects() {
            scene.add_object(object);
        }
        engine_info!(
            scene = %scene.name,
            objects = scene.objects.len(),
            "Scene built from description"
        );
        scene
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // ========== 对象管理 ==========

    /// 加入对象，下一次激活遍历时激活
    pub fn add_object(&mut self, object: GameObject) -> ObjectId {
        let id = object.id();
        tracing::debug!(scene = %self.name, object = %id, name = %object.name(), "object added");
        self.objects.push(object);
        id
    }

    pub fn object(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.id() == id)
    }

    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut GameObject> {
        self.objects.iter_mut().find(|o| o.id() == id)
    }

    /// 按名称查找第一个匹配的对象
    pub fn object_by_name(&self, name: &str) -> Option<&GameObject> {
        self.objects.iter().find(|o| o.name() == name)
    }

    /// 移出对象并交还所有权
    ///
    /// 只能在帧间调用。其他对象中指向它的句柄随之失效。
    pub fn remove_object(&mut self, id: ObjectId) -> Result<GameObject> {
        match self.objects.iter().position(|o| o.id() == id) {
            Some(index) => Ok(self.objects.remove(index)),
            None => {
                let err = MisuseError::UnknownObject(id);
                engine_error!(scene = %self.name, "{}", err);
                Err(err.into())
            }
        }
    }

    /// 全部对象，按加入顺序
    pub fn objects(&self) -> &[GameObject] {
        &self.objects
    }

    /// 参与每帧更新的对象数
    pub fn active_count(&self) -> usize {
        self.objects.iter().filter(|o| o.is_active()).count()
    }

    // ========== 帧驱动 ==========

    /// 激活所有待处理的对象
    ///
    /// 某个对象失败只影响它自己，其余对象照常激活。
    pub fn activate(&mut self) -> ActivationReport {
        let mut report = ActivationReport::default();

        for object in self.objects.iter_mut() {
            if object.state() != ObjectState::Pending {
                continue;
            }
            match object.activate() {
                Ok(()) => report.activated.push(object.id()),
                Err(err) => report.failed.push((object.id(), err)),
            }
        }

        if !report.is_clean() {
            engine_warn!(
                scene = %self.name,
                failed = report.failed.len(),
                "Some objects failed to activate and will not be updated"
            );
        }

        report
    }

    /// 执行一帧
    pub fn frame(&mut self) -> FrameStats {
        let delta = self.delta_time.update();
        self.elapsed += self.delta_time.delta();

        self.activate();

        let active: Vec<&GameObject> = self.objects.iter().filter(|o| o.is_active()).collect();
        let live: Vec<Rc<RefCell<dyn Component>>> =
            active.iter().flat_map(|o| o.live_components()).collect();

        let _span = tracing::trace_span!("frame", frame = self.frame).entered();

        let state = StateInfo::new(
            delta,
            self.frame,
            self.fixed_step.step().as_secs_f32(),
        );
        let fixed_state = state.fixed();
        let fixed_steps = self.fixed_step.accumulate(self.delta_time.delta());

        for phase in Phase::ORDER {
            match phase {
                Phase::FixedUpdate => {
                    for _ in 0..fixed_steps {
                        dispatch(&live, phase, &fixed_state);
                    }
                }
                _ => dispatch(&live, phase, &state),
            }
        }

        let stats = FrameStats {
            frame: self.frame,
            delta_time: delta,
            fixed_steps,
            active_objects: active.len(),
            components: live.len(),
        };

        self.frame += 1;
        stats
    }

    /// 连续执行若干帧
    pub fn run_frames(&mut self, count: u64) -> Vec<FrameStats> {
        (0..count).map(|_| self.frame()).collect()
    }

    /// 已执行的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    /// 所有帧间隔之和（截断后）
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn delta_time(&self) -> &DeltaTime<C> {
        &self.delta_time
    }

    pub fn fixed_step(&self) -> &FixedStep {
        &self.fixed_step
    }
}

/// 在所有组件上执行一个阶段
///
/// 组件被外部借用时跳过并记录，不影响其他组件。
fn dispatch(live: &[Rc<RefCell<dyn Component>>], phase: Phase, state: &StateInfo) {
    for component in live {
        let Ok(mut component) = component.try_borrow_mut() else {
            engine_error!(phase = %phase, "Component is borrowed elsewhere, skipped");
            continue;
        };

        match phase {
            Phase::EarlyUpdate => component.early_update(state),
            Phase::Update => component.update(state),
            Phase::LateUpdate => component.late_update(state),
            Phase::FixedUpdate => component.fixed_update(state),
            Phase::FrameCleanup => component.frame_cleanup(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{
        Camera, ComponentBase, ComponentKind, ProjectionType, RequiredComponents, ResourceRef,
        Transform2D,
    };
    use crate::core::error::ResolveError;
    use crate::core::math::Vector2;
    use crate::runtime::ManualClock;

    type Log = Rc<RefCell<Vec<String>>>;

    /// 记录每个阶段调用的测试组件
    struct Recorder<const ID: usize> {
        base: ComponentBase,
        log: Log,
        requires: Vec<ComponentKind>,
        follow: ResourceRef<Transform2D>,
    }

    impl<const ID: usize> Recorder<ID> {
        fn new(log: &Log) -> Self {
            Self {
                base: ComponentBase::new(format!("Recorder{}", ID)),
                log: log.clone(),
                requires: Vec::new(),
                follow: ResourceRef::empty(),
            }
        }

        fn following_transform(mut self) -> Self {
            self.requires.push(ComponentKind::of::<Transform2D>());
            self
        }

        fn requiring(mut self, kind: ComponentKind) -> Self {
            self.requires.push(kind);
            self
        }

        fn record(&self, line: String) {
            self.log.borrow_mut().push(line);
        }
    }

    impl<const ID: usize> Component for Recorder<ID> {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }

        fn required_kinds(&self) -> Vec<ComponentKind> {
            self.requires.clone()
        }

        fn set_required_components(&mut self, required: RequiredComponents) {
            if let Some(transform) = required.get::<Transform2D>() {
                self.follow = transform;
            }
        }

        fn early_update(&mut self, _state: &StateInfo) {
            self.record(format!("early {}", ID));
        }

        fn update(&mut self, state: &StateInfo) {
            self.record(format!("update {} frame {}", ID, state.frame));
            if !self.requires.is_empty() && self.follow.with(|t| t.position()).is_none() {
                self.record(format!("lost {}", ID));
            }
        }

        fn late_update(&mut self, _state: &StateInfo) {
            self.record(format!("late {}", ID));
        }

        fn fixed_update(&mut self, state: &StateInfo) {
            self.record(format!("fixed {} dt {}", ID, state.delta_time));
        }

        fn frame_cleanup(&mut self) {
            self.record(format!("cleanup {}", ID));
            self.base.clear_changed();
        }
    }

    fn time_config() -> TimeConfig {
        TimeConfig {
            max_delta: 1.0,
            fixed_timestep_ms: 16,
            max_fixed_steps: 64,
            frame_limit: 0,
        }
    }

    fn scene_with_clock(config: &TimeConfig) -> (Scene<Rc<ManualClock>>, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new());
        let scene = Scene::with_clock("Test", config, clock.clone());
        (scene, clock)
    }

    fn object_with<const ID: usize>(name: &str, log: &Log) -> GameObject {
        let mut object = GameObject::new(name);
        object.add_component(Recorder::<ID>::new(log)).unwrap();
        object
    }

    #[test]
    fn test_phases_run_breadth_first() {
        let log = Log::default();
        let (mut scene, clock) = scene_with_clock(&time_config());
        scene.add_object(object_with::<0>("A", &log));
        scene.add_object(object_with::<1>("B", &log));

        // 第一帧的帧间隔为 0，不执行 fixed_update
        let first = scene.frame();
        assert_eq!(first.delta_time, 0.0);
        assert_eq!(first.fixed_steps, 0);
        log.borrow_mut().clear();

        clock.advance(Duration::from_millis(16));
        let second = scene.frame();
        assert_eq!(second.frame, 1);
        assert_eq!(second.fixed_steps, 1);

        let fixed_dt = Duration::from_millis(16).as_secs_f32();
        assert_eq!(
            *log.borrow(),
            vec![
                "early 0".to_string(),
                "early 1".to_string(),
                "update 0 frame 1".to_string(),
                "update 1 frame 1".to_string(),
                "late 0".to_string(),
                "late 1".to_string(),
                format!("fixed 0 dt {}", fixed_dt),
                format!("fixed 1 dt {}", fixed_dt),
                "cleanup 0".to_string(),
                "cleanup 1".to_string(),
            ]
        );
    }

    #[test]
    fn test_fixed_update_runs_per_accumulated_step() {
        let log = Log::default();
        let (mut scene, clock) = scene_with_clock(&time_config());
        scene.add_object(object_with::<0>("A", &log));

        scene.frame();
        clock.advance(Duration::from_millis(40));
        assert_eq!(scene.frame().fixed_steps, 2);
        clock.advance(Duration::from_millis(8));
        assert_eq!(scene.frame().fixed_steps, 1);
        clock.advance(Duration::from_millis(10));
        assert_eq!(scene.frame().fixed_steps, 0);
    }

    #[test]
    fn test_fixed_steps_are_capped() {
        let mut config = time_config();
        config.max_fixed_steps = 4;
        let (mut scene, clock) = scene_with_clock(&config);
        scene.add_object(GameObject::with_transform_2d("Body"));

        scene.frame();
        clock.advance(Duration::from_millis(500));
        let stats = scene.frame();
        assert_eq!(stats.fixed_steps, 4);
        assert!(scene.fixed_step().remainder() < Duration::from_millis(16));
    }

    #[test]
    fn test_long_stall_is_clamped() {
        let (mut scene, clock) = scene_with_clock(&time_config());
        scene.frame();
        clock.advance(Duration::from_secs(5));
        let stats = scene.frame();
        assert_eq!(stats.delta_time, 1.0);
        assert_eq!(scene.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_failed_object_is_inert() {
        let log = Log::default();
        let (mut scene, _clock) = scene_with_clock(&time_config());

        let mut broken = GameObject::new("Broken");
        broken
            .add_component(Recorder::<7>::new(&log).requiring(ComponentKind::of::<Camera>()))
            .unwrap();
        let broken_id = scene.add_object(broken);
        let healthy_id = scene.add_object(object_with::<0>("Healthy", &log));

        let report = scene.activate();
        assert_eq!(report.activated, vec![healthy_id]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, broken_id);
        assert!(matches!(
            report.failed[0].1,
            DistSceneError::Resolve(ResolveError::MissingDependency { missing: "Camera", .. })
        ));

        let stats = scene.frame();
        assert_eq!(stats.active_objects, 1);
        assert!(log.borrow().iter().all(|line| !line.contains('7')));
        assert_eq!(scene.object(broken_id).map(|o| o.state()), Some(ObjectState::Failed));
    }

    #[test]
    fn test_late_objects_join_next_frame() {
        let log = Log::default();
        let (mut scene, _clock) = scene_with_clock(&time_config());
        scene.add_object(object_with::<0>("First", &log));
        scene.frame();

        let late = scene.add_object(object_with::<1>("Late", &log));
        assert_eq!(scene.object(late).map(|o| o.state()), Some(ObjectState::Pending));

        log.borrow_mut().clear();
        let stats = scene.frame();
        assert_eq!(stats.active_objects, 2);
        assert!(log.borrow().contains(&"early 1".to_string()));
    }

    #[test]
    fn test_lookup_and_remove() {
        let (mut scene, _clock) = scene_with_clock(&time_config());
        let id = scene.add_object(GameObject::with_transform_3d("Player"));

        assert_eq!(scene.object_by_name("Player").map(|o| o.id()), Some(id));
        assert!(scene.object_by_name("Nobody").is_none());
        assert!(scene.object_mut(id).is_some());

        let removed = scene.remove_object(id).unwrap();
        assert_eq!(removed.name(), "Player");
        assert!(scene.objects().is_empty());

        let err = scene.remove_object(id).unwrap_err();
        assert!(matches!(err, DistSceneError::Misuse(MisuseError::UnknownObject(missing)) if missing == id));
    }

    #[test]
    fn test_required_component_survives_removal_attempt() {
        let log = Log::default();
        let (mut scene, _clock) = scene_with_clock(&time_config());

        let mut object = GameObject::with_transform_2d("Follower");
        object
            .add_component(Recorder::<0>::new(&log).following_transform())
            .unwrap();
        let id = scene.add_object(object);
        scene.frame();

        // 帧间移除仍被依赖的组件被拒绝，依赖方的句柄保持有效
        let object = scene.object_mut(id).unwrap();
        assert!(!object.remove_component::<Transform2D>());
        assert!(object.has_component::<Transform2D>());

        let stats = scene.frame();
        assert_eq!(stats.components, 2);
        assert!(!log.borrow().contains(&"lost 0".to_string()));

        scene.frame();
        assert_eq!(scene.frame_count(), 3);
    }

    #[test]
    fn test_perspective_camera_without_transform_3d_fails_alone() {
        let description = SceneConfig::from_toml(
            r#"
            name = "Broken"

            [[objects]]
            name = "BadCamera"

            [[objects.components]]
            type = "transform2d"

            [[objects.components]]
            type = "camera"
            projection = "perspective"

            [[objects]]
            name = "Ground"

            [[objects.components]]
            type = "transform2d"
            position = [1.0, 2.0]
            "#,
        )
        .unwrap();

        let clock = Rc::new(ManualClock::new());
        let mut scene = Scene::from_config(&description, &time_config(), clock);
        let bad = scene.object_by_name("BadCamera").map(|o| o.id()).unwrap();
        let ground = scene.object_by_name("Ground").map(|o| o.id()).unwrap();

        let report = scene.activate();
        assert_eq!(report.activated, vec![ground]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, bad);
        assert!(matches!(
            report.failed[0].1,
            DistSceneError::Resolve(ResolveError::MissingDependency { missing: "Transform3D", .. })
        ));

        let stats = scene.frame();
        assert_eq!(stats.active_objects, 1);
        assert_eq!(scene.object(bad).map(|o| o.state()), Some(ObjectState::Failed));
    }

    #[test]
    fn test_infinite_max_delta_falls_back() {
        let mut config = time_config();
        config.max_delta = f32::INFINITY;
        let (mut scene, clock) = scene_with_clock(&config);
        assert_eq!(scene.delta_time().max_delta(), Duration::from_secs(1));

        scene.frame();
        clock.advance(Duration::from_secs(3));
        assert_eq!(scene.frame().delta_time, 1.0);
    }

    #[test]
    fn test_objects_are_unlocked_between_frames() {
        let (mut scene, _clock) = scene_with_clock(&time_config());
        let id = scene.add_object(GameObject::with_transform_2d("Mover"));
        scene.frame();

        let object = scene.object_mut(id).unwrap();
        let transform = object.get_component::<Transform2D>().unwrap();
        transform.borrow_mut().set_position(Vector2::new(3.0, 4.0));
        assert!(object.remove_component::<Transform2D>());
    }

    #[test]
    fn test_camera_scene_from_description() {
        let clock = Rc::new(ManualClock::new());
        let mut scene = Scene::from_config(&SceneConfig::default(), &time_config(), clock.clone());
        assert_eq!(scene.name(), "Default");

        let stats = scene.run_frames(3);
        assert_eq!(stats.len(), 3);
        assert_eq!(stats[2].frame, 2);
        assert_eq!(stats[0].components, 2);

        let camera = scene
            .object_by_name("MainCamera")
            .and_then(|o| o.get_component::<Camera>())
            .unwrap();
        assert_eq!(camera.borrow().projection_type(), ProjectionType::Orthographic);
        assert!(!camera.borrow().has_changed());
    }
}
