//! 核心功能模块
//!
//! 本模块提供场景层的基础功能，包括数学库、日志系统、配置管理、错误处理
//! 以及场景描述文件。
//!
//! # 模块组织
//!
//! - `math`：数学库，提供向量、矩阵、四元数等常用数学类型
//! - `log`：日志系统，提供结构化的日志记录功能
//! - `config`：配置管理，支持从配置文件加载帧时间与日志设置
//! - `error`：错误处理，定义统一的错误类型
//! - `scene`：场景描述，从 TOML 文件声明对象及其组件

pub mod math;
pub mod log;
pub mod config;
pub mod error;
pub mod scene;

// 重新导出常用类型，方便使用
pub use math::{Vector2, Vector3, Vector4, Matrix4, Quaternion};
pub use error::{Result, DistSceneError, ConfigError, ResolveError, MisuseError};
pub use config::{Config, TimeConfig};
pub use scene::SceneConfig;
