//! DistScene - DistRender 的场景层
//!
//! 管理游戏对象与组件的生命周期：组件按类型挂到对象上，激活时解析组件之间的
//! 依赖并按拓扑顺序启动，之后由场景按固定的阶段顺序逐帧驱动。
//!
//! # 模块结构
//!
//! - `core`: 核心功能模块（数学、日志、配置、错误处理、场景描述）
//! - `component`: GameObject、组件契约、依赖解析与内置组件
//! - `resource`: 组件持有的 GPU 缓冲区及其后端
//! - `runtime`: 帧时间、固定步长与场景驱动
//!
//! # 使用示例
//!
//! ```
//! use dist_scene::component::{GameObject, ProjectionType};
//! use dist_scene::core::TimeConfig;
//! use dist_scene::runtime::Scene;
//!
//! let mut scene = Scene::new("Demo", &TimeConfig::default());
//! scene.add_object(GameObject::with_camera("MainCamera", ProjectionType::Perspective));
//!
//! let report = scene.activate();
//! assert!(report.is_clean());
//!
//! let stats = scene.frame();
//! assert_eq!(stats.active_objects, 1);
//! ```

pub mod core;
pub mod component;
pub mod resource;
pub mod runtime;
