//! 组件基类
//!
//! 所有组件共享同一套生命周期契约：
//!
//! ```text
//! start()                       激活时调用一次，依赖已全部启动
//! early_update(state)  ┐
//! update(state)        │        每帧按阶段广度优先执行
//! late_update(state)   │
//! fixed_update(state)  │        每帧 0..n 次，固定步长
//! frame_cleanup()      ┘        每帧最后执行，清除变更标记
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::{ComponentKind, ObjectRef, ResourceRef};
use crate::core::error::Result;
use crate::runtime::StateInfo;

/// 组件 trait
///
/// 所有游戏对象组件的基础接口。具体组件内嵌一个 [`ComponentBase`]，
/// 名称、所属对象和变更标记都由它保存。
pub trait Component: Any {
    /// 共享的组件状态
    fn base(&self) -> &ComponentBase;

    /// 共享的组件状态（可变）
    fn base_mut(&mut self) -> &mut ComponentBase;

    /// 获取组件名称
    fn name(&self) -> &str {
        self.base().name()
    }

    /// 一次性初始化
    ///
    /// 在声明的全部依赖已注入并启动之后调用。返回错误会中止所属对象的激活。
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn early_update(&mut self, _state: &StateInfo) {}

    fn update(&mut self, _state: &StateInfo) {}

    fn late_update(&mut self, _state: &StateInfo) {}

    /// 以固定步长调用，`state.delta_time` 即为固定步长
    fn fixed_update(&mut self, _state: &StateInfo) {}

    /// 帧末清理，默认清除变更标记
    fn frame_cleanup(&mut self) {
        self.base_mut().clear_changed();
    }

    /// 自上次 frame_cleanup 以来可观察状态是否发生变化
    fn has_changed(&self) -> bool {
        self.base().has_changed()
    }

    /// start() 之前必须解析的组件类型
    fn required_kinds(&self) -> Vec<ComponentKind> {
        Vec::new()
    }

    /// 依赖解析成功后由所属对象注入依赖句柄
    fn set_required_components(&mut self, _required: RequiredComponents) {}
}

/// 组件共享状态
#[derive(Debug)]
pub struct ComponentBase {
    /// 组件名称
    name: String,

    /// 所属对象（弱引用）
    object: ObjectRef,

    /// 变更标记
    changed: bool,
}

impl ComponentBase {
    /// 创建新的组件状态
    ///
    /// 新组件在第一帧视为已变更。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object: ObjectRef::detached(),
            changed: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// 所属对象，未附加时为失效引用
    pub fn object(&self) -> &ObjectRef {
        &self.object
    }

    /// 标记可观察状态已变化
    pub fn mark_changed(&mut self) {
        self.changed = true;
    }

    pub fn has_changed(&self) -> bool {
        self.changed
    }

    pub fn clear_changed(&mut self) {
        self.changed = false;
    }

    pub(crate) fn attach(&mut self, object: ObjectRef) {
        self.object = object;
    }
}

/// 注入给组件的已解析依赖
///
/// 只保存弱引用，不延长依赖组件的生命周期。
#[derive(Default)]
pub struct RequiredComponents {
    entries: Vec<(ComponentKind, Weak<dyn Any>)>,
}

impl RequiredComponents {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, kind: ComponentKind, component: &Rc<dyn Any>) {
        self.entries.push((kind, Rc::downgrade(component)));
    }

    /// 获取类型 `T` 的依赖句柄
    ///
    /// 没有声明该依赖，或依赖已被销毁时返回 `None`。
    pub fn get<T: Component>(&self) -> Option<ResourceRef<T>> {
        let kind = ComponentKind::of::<T>();
        let (_, weak) = self.entries.iter().find(|(k, _)| *k == kind)?;
        let shared = weak.upgrade()?.downcast::<RefCell<T>>().ok()?;
        Some(ResourceRef::new(&shared))
    }

    /// 已注入的依赖类型
    pub fn kinds(&self) -> impl Iterator<Item = ComponentKind> + '_ {
        self.entries.iter().map(|(kind, _)| *kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        base: ComponentBase,
        value: u32,
    }

    impl Counter {
        fn increment(&mut self) {
            self.value += 1;
            self.base.mark_changed();
        }
    }

    impl Component for Counter {
        fn base(&self) -> &ComponentBase {
            &self.base
        }

        fn base_mut(&mut self) -> &mut ComponentBase {
            &mut self.base
        }
    }

    #[test]
    fn test_change_tracking() {
        let mut counter = Counter { base: ComponentBase::new("Counter"), value: 0 };
        assert!(counter.has_changed());

        counter.frame_cleanup();
        assert!(!counter.has_changed());

        counter.increment();
        assert!(counter.has_changed());
        assert_eq!(counter.value, 1);

        counter.frame_cleanup();
        assert!(!counter.has_changed());
    }

    #[test]
    fn test_defaults() {
        let counter = Counter { base: ComponentBase::new("Counter"), value: 0 };
        assert_eq!(counter.name(), "Counter");
        assert!(counter.required_kinds().is_empty());
        assert!(!counter.base().object().is_alive());
    }

    #[test]
    fn test_required_components_lookup() {
        let shared = Rc::new(RefCell::new(Counter { base: ComponentBase::new("Counter"), value: 3 }));
        let any: Rc<dyn Any> = shared.clone();

        let mut required = RequiredComponents::new();
        required.insert(ComponentKind::of::<Counter>(), &any);
        assert_eq!(required.len(), 1);

        let handle = required.get::<Counter>().unwrap();
        assert_eq!(handle.with(|c| c.value), Some(3));

        drop(any);
        drop(shared);
        assert!(required.get::<Counter>().is_none());
    }
}
