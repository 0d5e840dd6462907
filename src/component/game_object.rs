//! GameObject 组件容器
//!
//! 管理游戏对象及其附加的组件，负责：
//!
//! - 保证每种组件类型最多一个实例
//! - 按类型查找组件（返回共享引用）
//! - 激活时一次性完成依赖解析：拓扑排序后按顺序注入依赖并调用 `start()`
//!
//! 依赖解析不在添加组件时进行，而是推迟到第一帧之前的单次遍历，
//! 这样相互查找的组件在构造阶段不会陷入先有鸡还是先有蛋的问题，
//! 每个组件的 `start()` 恰好观察到一次完整连线的依赖集合。

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{
    Camera, Component, ComponentKind, ProjectionType, RequiredComponents, ResourceRef,
    Transform2D, Transform3D,
};
use crate::core::error::{MisuseError, ResolveError, Result};
use crate::{engine_error, engine_info};

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// 游戏对象的唯一标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl ObjectId {
    fn next() -> Self {
        ObjectId(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 对象生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectState {
    /// 尚未解析依赖，可以添加组件
    Pending,
    /// 依赖解析成功，参与每帧更新
    Active,
    /// 依赖解析失败，永远不参与每帧更新
    Failed,
}

/// 组件存储包装器
struct ComponentBox {
    /// 组件类型
    kind: ComponentKind,
    /// 用于生命周期分发
    component: Rc<RefCell<dyn Component>>,
    /// 同一实例的类型擦除视图，用于按类型向下转换
    any: Rc<dyn Any>,
}

pub(crate) struct ObjectInner {
    id: ObjectId,
    name: RefCell<String>,
    state: Cell<ObjectState>,
    components: RefCell<Vec<ComponentBox>>,
}

impl ObjectInner {
    fn find<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        let kind = ComponentKind::of::<T>();
        let components = self.components.borrow();
        let entry = components.iter().find(|c| c.kind == kind)?;
        entry.any.clone().downcast::<RefCell<T>>().ok()
    }

    fn name(&self) -> String {
        self.name.borrow().clone()
    }
}

/// GameObject - 游戏对象
///
/// 作为组件容器独占其组件。组件通过 [`ObjectRef`] 弱引用回指对象，
/// 对象销毁时所有组件随之销毁（除非外部仍持有共享引用）。
pub struct GameObject {
    inner: Rc<ObjectInner>,
}

impl GameObject {
    /// 创建新的 GameObject
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ObjectInner {
                id: ObjectId::next(),
                name: RefCell::new(name.into()),
                state: Cell::new(ObjectState::Pending),
                components: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// 设置名称
    pub fn set_name(&mut self, name: impl Into<String>) {
        *self.inner.name.borrow_mut() = name.into();
    }

    /// 获取名称
    pub fn name(&self) -> String {
        self.inner.name()
    }

    pub fn state(&self) -> ObjectState {
        self.inner.state.get()
    }

    /// 是否参与每帧更新
    pub fn is_active(&self) -> bool {
        self.state() == ObjectState::Active
    }

    /// 创建指向本对象的弱引用
    pub fn downgrade(&self) -> ObjectRef {
        ObjectRef {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // ========== 组件管理 ==========

    /// 添加组件
    ///
    /// 只能在对象激活之前添加。同类组件已存在时拒绝添加，原有实例保持不变。
    /// 帧内无法取得对象的可变引用，因此帧内修改在编译期就被排除。
    ///
    /// # 示例
    /// ```
    /// use dist_scene::component::{Component, GameObject, Transform3D};
    ///
    /// let mut go = GameObject::new("Player");
    /// let transform = go.add_component(Transform3D::new("PlayerTransform")).unwrap();
    /// assert_eq!(transform.borrow().name(), "PlayerTransform");
    /// ```
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<Rc<RefCell<T>>> {
        let kind = ComponentKind::of::<T>();

        let rejected = if self.state() != ObjectState::Pending {
            Some(MisuseError::ObjectNotPending {
                object: self.name(),
                state: self.state(),
            })
        } else if self.has_kind(kind) {
            Some(MisuseError::DuplicateComponent {
                object: self.name(),
                kind: kind.short_name(),
            })
        } else {
            None
        };

        if let Some(err) = rejected {
            engine_error!(object = %self.id(), "{}", err);
            return Err(err.into());
        }

        Ok(self.insert(component))
    }

    fn insert<T: Component>(&mut self, mut component: T) -> Rc<RefCell<T>> {
        component.base_mut().attach(self.downgrade());

        let shared = Rc::new(RefCell::new(component));
        let dispatch: Rc<RefCell<dyn Component>> = shared.clone();
        let any: Rc<dyn Any> = shared.clone();

        self.inner.components.borrow_mut().push(ComponentBox {
            kind: ComponentKind::of::<T>(),
            component: dispatch,
            any,
        });

        shared
    }

    /// 移除组件（按类型）
    ///
    /// 激活后的对象上，仍被其他组件声明为依赖的组件不能移除，
    /// 以免依赖方在缺少依赖的状态下继续参与每帧更新。
    ///
    /// # 返回
    /// 如果找到并移除了组件，返回 `true`；否则返回 `false`
    pub fn remove_component<T: Component>(&mut self) -> bool {
        let kind = ComponentKind::of::<T>();

        if self.is_active() {
            if let Some(dependent) = self.dependent_of(kind) {
                let err = MisuseError::RequiredByDependent {
                    object: self.name(),
                    kind: kind.short_name(),
                    dependent,
                };
                engine_error!(object = %self.id(), "{}", err);
                return false;
            }
        }

        let mut components = self.inner.components.borrow_mut();
        if let Some(index) = components.iter().position(|c| c.kind == kind) {
            components.remove(index);
            true
        } else {
            false
        }
    }

    /// 第一个声明依赖 `kind` 的其他组件
    fn dependent_of(&self, kind: ComponentKind) -> Option<&'static str> {
        self.inner
            .components
            .borrow()
            .iter()
            .filter(|c| c.kind != kind)
            .find(|c| {
                c.component
                    .try_borrow()
                    .map(|component| component.required_kinds().contains(&kind))
                    .unwrap_or(false)
            })
            .map(|c| c.kind.short_name())
    }

    /// 获取组件的共享引用
    ///
    /// # 示例
    /// ```
    /// use dist_scene::component::{GameObject, Transform3D};
    /// use dist_scene::core::math::Vector3;
    ///
    /// let mut go = GameObject::new("Player");
    /// go.add_component(Transform3D::default()).unwrap();
    ///
    /// if let Some(transform) = go.get_component::<Transform3D>() {
    ///     transform.borrow_mut().set_position(Vector3::new(1.0, 0.0, 0.0));
    /// }
    /// ```
    pub fn get_component<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        self.inner.find::<T>()
    }

    /// 获取组件的弱引用句柄
    pub fn get_component_ref<T: Component>(&self) -> Option<ResourceRef<T>> {
        self.get_component::<T>().map(|shared| ResourceRef::new(&shared))
    }

    /// 检查是否有指定类型的组件
    pub fn has_component<T: Component>(&self) -> bool {
        self.has_kind(ComponentKind::of::<T>())
    }

    fn has_kind(&self, kind: ComponentKind) -> bool {
        self.inner.components.borrow().iter().any(|c| c.kind == kind)
    }

    /// 获取组件数量
    pub fn component_count(&self) -> usize {
        self.inner.components.borrow().len()
    }

    /// 组件类型，按存储顺序（激活后即依赖顺序）
    pub fn component_kinds(&self) -> Vec<ComponentKind> {
        self.inner.components.borrow().iter().map(|c| c.kind).collect()
    }

    /// 组件名称，按存储顺序
    pub fn component_names(&self) -> Vec<String> {
        self.inner
            .components
            .borrow()
            .iter()
            .map(|c| c.component.borrow().name().to_string())
            .collect()
    }

    // ========== 依赖解析 ==========

    /// 激活对象：解析依赖并按拓扑顺序启动全部组件
    ///
    /// 只执行一次。缺失依赖、循环依赖或某个组件 `start()` 失败都会使对象进入
    /// [`ObjectState::Failed`]，此后对象不会参与任何帧阶段。
    /// 缺失依赖与循环依赖在任何 `start()` 调用之前检测。
    pub fn activate(&mut self) -> Result<()> {
        match self.state() {
            ObjectState::Active => return Ok(()),
            ObjectState::Failed => {
                let err = MisuseError::ObjectNotPending {
                    object: self.name(),
                    state: ObjectState::Failed,
                };
                engine_error!(object = %self.id(), "{}", err);
                return Err(err.into());
            }
            ObjectState::Pending => {}
        }

        match self.resolve_and_start() {
            Ok(()) => {
                self.inner.state.set(ObjectState::Active);
                engine_info!(
                    object = %self.id(),
                    name = %self.name(),
                    components = self.component_count(),
                    "GameObject activated"
                );
                Ok(())
            }
            Err(err) => {
                self.inner.state.set(ObjectState::Failed);
                engine_error!(object = %self.id(), "{}", err);
                Err(err.into())
            }
        }
    }

    fn resolve_and_start(&self) -> std::result::Result<(), ResolveError> {
        let order = self.resolve_order()?;

        // 按依赖顺序重排存储，之后每帧的阶段都按此顺序执行
        {
            let mut components = self.inner.components.borrow_mut();
            let mut slots: Vec<Option<ComponentBox>> = components.drain(..).map(Some).collect();
            *components = order.iter().filter_map(|&i| slots[i].take()).collect();
        }

        let snapshot: Vec<(ComponentKind, Rc<RefCell<dyn Component>>)> = self
            .inner
            .components
            .borrow()
            .iter()
            .map(|c| (c.kind, c.component.clone()))
            .collect();

        for (kind, component) in snapshot {
            let required = self.collect_required(&component);
            component.borrow_mut().set_required_components(required);

            let started = component.borrow_mut().start();
            if let Err(err) = started {
                return Err(ResolveError::StartFailed {
                    object: self.name(),
                    id: self.id(),
                    component: kind.short_name().to_string(),
                    reason: err.to_string(),
                });
            }

            tracing::debug!(object = %self.id(), component = %kind, "component started");
        }

        Ok(())
    }

    fn collect_required(&self, component: &Rc<RefCell<dyn Component>>) -> RequiredComponents {
        let kinds = component.borrow().required_kinds();
        let components = self.inner.components.borrow();
        let mut required = RequiredComponents::new();

        for kind in dedup(kinds) {
            if let Some(entry) = components.iter().find(|c| c.kind == kind) {
                required.insert(kind, &entry.any);
            }
        }

        required
    }

    /// 计算拓扑顺序（Kahn 算法，就绪节点按添加顺序出队）
    fn resolve_order(&self) -> std::result::Result<Vec<usize>, ResolveError> {
        let components = self.inner.components.borrow();
        let index: HashMap<ComponentKind, usize> = components
            .iter()
            .enumerate()
            .map(|(i, c)| (c.kind, i))
            .collect();

        let mut requires: Vec<Vec<usize>> = Vec::with_capacity(components.len());
        for entry in components.iter() {
            let mut deps = Vec::new();
            for kind in dedup(entry.component.borrow().required_kinds()) {
                match index.get(&kind) {
                    Some(&dep) => deps.push(dep),
                    None => {
                        return Err(ResolveError::MissingDependency {
                            object: self.name(),
                            id: self.id(),
                            component: entry.kind.short_name().to_string(),
                            missing: kind.short_name(),
                        })
                    }
                }
            }
            requires.push(deps);
        }

        let count = components.len();
        let mut in_degree: Vec<usize> = requires.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
        for (i, deps) in requires.iter().enumerate() {
            for &dep in deps {
                dependents[dep].push(i);
            }
        }

        let mut ready: BTreeSet<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(count);

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if order.len() < count {
            let remaining: Vec<bool> = in_degree.iter().map(|&d| d > 0).collect();
            let cycle = find_cycle(&requires, &remaining)
                .into_iter()
                .map(|i| components[i].kind.short_name())
                .collect();

            return Err(ResolveError::DependencyCycle {
                object: self.name(),
                id: self.id(),
                cycle,
            });
        }

        Ok(order)
    }

    // ========== 帧驱动接口 ==========

    /// 按依赖顺序取出组件快照，供场景在帧内分发
    pub(crate) fn live_components(&self) -> Vec<Rc<RefCell<dyn Component>>> {
        self.inner
            .components
            .borrow()
            .iter()
            .map(|c| c.component.clone())
            .collect()
    }

    // ========== 便捷方法 ==========

    /// 创建带有 Transform2D 组件的 GameObject
    pub fn with_transform_2d(name: impl Into<String>) -> Self {
        let mut go = Self::new(name);
        go.insert(Transform2D::default());
        go
    }

    /// 创建带有 Transform3D 组件的 GameObject
    pub fn with_transform_3d(name: impl Into<String>) -> Self {
        let mut go = Self::new(name);
        go.insert(Transform3D::default());
        go
    }

    /// 创建相机对象
    ///
    /// 同时携带 2D 和 3D 变换，切换投影类型时无需增删组件。
    pub fn with_camera(name: impl Into<String>, projection: ProjectionType) -> Self {
        let mut go = Self::new(name);
        go.insert(Transform2D::default());
        go.insert(Transform3D::default());
        go.insert(Camera::new("Camera", projection));
        go
    }
}

/// 沿仍有未满足依赖的节点前进，必然回到访问过的节点，返回闭合的环
fn find_cycle(requires: &[Vec<usize>], remaining: &[bool]) -> Vec<usize> {
    let Some(start) = remaining.iter().position(|&r| r) else {
        return Vec::new();
    };

    let mut visited_at: Vec<Option<usize>> = vec![None; requires.len()];
    let mut path = Vec::new();
    let mut node = start;

    loop {
        if let Some(pos) = visited_at[node] {
            let mut cycle = path[pos..].to_vec();
            cycle.push(node);
            return cycle;
        }
        visited_at[node] = Some(path.len());
        path.push(node);

        match requires[node].iter().copied().find(|&dep| remaining[dep]) {
            Some(dep) => node = dep,
            None => return path,
        }
    }
}

fn dedup(kinds: Vec<ComponentKind>) -> Vec<ComponentKind> {
    let mut unique = Vec::with_capacity(kinds.len());
    for kind in kinds {
        if !unique.contains(&kind) {
            unique.push(kind);
        }
    }
    unique
}

impl Default for GameObject {
    fn default() -> Self {
        Self::new("GameObject")
    }
}

impl fmt::Debug for GameObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameObject")
            .field("id", &self.id())
            .field("name", &self.name())
            .field("state", &self.state())
            .field("components", &self.component_kinds())
            .finish()
    }
}

impl Drop for GameObject {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        {
            let count = self.inner.components.borrow().len();
            if count > 0 {
                tracing::debug!(
                    "GameObject '{}' being dropped with {} components",
                    self.inner.name(),
                    count
                );
            }
        }
    }
}

/// 组件指向所属对象的弱引用
///
/// 只用于查找，从不延长对象的生命周期。对象销毁后所有查询返回 `None`。
#[derive(Clone)]
pub struct ObjectRef {
    inner: Weak<ObjectInner>,
}

impl ObjectRef {
    /// 不指向任何对象的引用
    pub fn detached() -> Self {
        Self { inner: Weak::new() }
    }

    /// 对象是否仍然存在
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    pub fn id(&self) -> Option<ObjectId> {
        self.inner.upgrade().map(|inner| inner.id)
    }

    pub fn name(&self) -> Option<String> {
        self.inner.upgrade().map(|inner| inner.name())
    }

    /// 查找同一对象上的兄弟组件
    ///
    /// 对象已销毁时记录误用错误并返回 `None`。
    pub fn get_component<T: Component>(&self) -> Option<Rc<RefCell<T>>> {
        match self.inner.upgrade() {
            Some(inner) => inner.find::<T>(),
            None => {
                let err = MisuseError::InvalidResource(format!(
                    "owning object of {} is gone",
                    ComponentKind::of::<T>()
                ));
                engine_error!("{}", err);
                None
            }
        }
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl Eq for ObjectRef {}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectRef")
            .field("id", &self.id())
            .finish()
    }
}
