//! 组件系统模块
//!
//! 提供 GameObject 容器、组件生命周期契约、依赖解析以及内置的
//! Transform2D、Transform3D、Camera 组件。

mod component;
mod kind;
mod handle;
mod game_object;
mod transform;
mod camera;

pub use component::{Component, ComponentBase, RequiredComponents};
pub use kind::ComponentKind;
pub use handle::ResourceRef;
pub use game_object::{GameObject, ObjectId, ObjectRef, ObjectState};
pub use transform::{Transform2D, Transform3D};
pub use camera::{Camera, ProjectionType};
