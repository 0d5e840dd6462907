//! 错误处理模块
//!
//! 定义了场景层中使用的统一错误类型，使用 `thiserror` 提供友好的错误消息。
//!
//! # 错误分类
//!
//! - [`ConfigError`]：配置文件加载与校验错误
//! - [`ResolveError`]：组件依赖解析错误（缺失依赖、循环依赖、启动失败），
//!   只会中止对应 GameObject 的激活，不会影响整个场景
//! - [`MisuseError`]：对无效资源的操作或破坏依赖关系的修改，记录日志后该操作为空操作

use thiserror::Error;

use crate::component::{ObjectId, ObjectState};

/// 场景层统一的 Result 类型
pub type Result<T> = std::result::Result<T, DistSceneError>;

/// DistScene 的错误类型
#[derive(Debug, Error)]
pub enum DistSceneError {
    /// 配置错误
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// 依赖解析错误
    #[error("Dependency resolution failed: {0}")]
    Resolve(#[from] ResolveError),

    /// 误用错误
    #[error("Misuse: {0}")]
    Misuse(#[from] MisuseError),

    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 组件自定义的启动错误
    #[error("Component error: {0}")]
    Component(String),
}

/// 配置相关的错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件未找到
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    /// 配置文件解析失败
    #[error("Failed to parse config: {0}")]
    ParseError(String),

    /// 配置值无效
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 依赖解析错误
///
/// 在 GameObject 激活时一次性检测。携带对象名称、ID 以及相关的组件类型名，
/// 无需重新运行即可定位问题。
#[derive(Debug, Error)]
pub enum ResolveError {
    /// 组件声明的依赖类型不存在于该对象上
    #[error("object '{object}' ({id}): component '{component}' requires missing component '{missing}'")]
    MissingDependency {
        object: String,
        id: ObjectId,
        component: String,
        missing: &'static str,
    },

    /// 组件之间存在循环依赖
    #[error("object '{object}' ({id}): dependency cycle {}", .cycle.join(" -> "))]
    DependencyCycle {
        object: String,
        id: ObjectId,
        cycle: Vec<&'static str>,
    },

    /// 组件的 start() 返回了错误
    #[error("object '{object}' ({id}): component '{component}' failed to start: {reason}")]
    StartFailed {
        object: String,
        id: ObjectId,
        component: String,
        reason: String,
    },
}

/// 误用错误
#[derive(Debug, Error)]
pub enum MisuseError {
    /// 使用了已失效或从未有效的资源
    #[error("used an invalid resource: {0}")]
    InvalidResource(String),

    /// 同一对象上重复添加同类组件
    #[error("object '{object}' already has a component of kind '{kind}'")]
    DuplicateComponent { object: String, kind: &'static str },

    /// 对象已经完成（或失败于）依赖解析，组件集合不能再改变
    #[error("object '{object}' is {state:?}, its component set is frozen")]
    ObjectNotPending { object: String, state: ObjectState },

    /// 激活后移除仍被其他组件依赖的组件
    #[error("object '{object}': component '{kind}' is still required by '{dependent}'")]
    RequiredByDependent {
        object: String,
        kind: &'static str,
        dependent: &'static str,
    },

    /// 在非存储缓冲区上绑定 base 索引
    #[error("tried to bind buffer base on non storage buffer: {0}")]
    NotStorageBuffer(u32),

    /// 局部更新超出缓冲区范围
    #[error("update region {offset}..{end} is outside buffer {handle} of {size} bytes")]
    RegionOutOfBounds {
        handle: u32,
        offset: usize,
        end: usize,
        size: usize,
    },

    /// 场景中不存在该对象
    #[error("no object with id {0} in scene")]
    UnknownObject(ObjectId),
}

impl ResolveError {
    /// 出错对象的 ID
    pub fn object_id(&self) -> ObjectId {
        match self {
            ResolveError::MissingDependency { id, .. }
            | ResolveError::DependencyCycle { id, .. }
            | ResolveError::StartFailed { id, .. } => *id,
        }
    }
}
