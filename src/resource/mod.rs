//! 资源模块
//!
//! 组件可以持有的 GPU 资源。场景层不关心资源内部，只要求资源随持有它的组件销毁。

mod backend;
mod buffer;

pub use backend::{BufferBackend, HeadlessBackend};
pub use buffer::{Buffer, BufferType, BufferUsage, UpdateRegion};
