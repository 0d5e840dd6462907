//! 缓冲区后端的统一抽象接口
//!
//! 场景层只把 GPU 资源当作"持有句柄的不透明资源"：创建、上传、删除。
//! 具体图形 API 的实现位于渲染层，这里只提供一个内存中的无头后端，
//! 供命令行程序和测试使用。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use super::{BufferType, BufferUsage};

/// 缓冲区后端接口
///
/// 句柄 `0` 表示创建失败。调用方保证传入的句柄有效、局部更新不越界。
pub trait BufferBackend {
    /// 创建缓冲区，返回句柄
    fn create_buffer(&self, buffer_type: BufferType) -> u32;

    /// 覆盖写入缓冲区内容
    fn upload(&self, handle: u32, data: &[u8], usage: BufferUsage);

    /// 从 `offset` 开始覆盖写入一段内容
    fn update_region(&self, handle: u32, offset: usize, data: &[u8]);

    /// 把存储缓冲区绑定到着色器的 base 索引
    fn bind_base(&self, handle: u32, index: u32);

    /// 删除缓冲区
    fn delete_buffer(&self, handle: u32);

    /// 获取后端的名称
    fn backend_name(&self) -> &str;
}

#[derive(Debug)]
struct HeadlessBuffer {
    buffer_type: BufferType,
    usage: Option<BufferUsage>,
    data: Vec<u8>,
}

/// 无头后端，缓冲区内容保存在内存中
#[derive(Debug, Default)]
pub struct HeadlessBackend {
    next_handle: Cell<u32>,
    buffers: RefCell<HashMap<u32, HeadlessBuffer>>,
    bases: RefCell<HashMap<u32, u32>>,
    uploads: Cell<usize>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 缓冲区当前内容
    pub fn contents(&self, handle: u32) -> Option<Vec<u8>> {
        self.buffers.borrow().get(&handle).map(|b| b.data.clone())
    }

    /// 最近一次整体上传时的用途提示
    pub fn usage(&self, handle: u32) -> Option<BufferUsage> {
        self.buffers.borrow().get(&handle).and_then(|b| b.usage)
    }

    pub fn buffer_type(&self, handle: u32) -> Option<BufferType> {
        self.buffers.borrow().get(&handle).map(|b| b.buffer_type)
    }

    /// 绑定在 base 索引上的缓冲区
    pub fn bound_base(&self, index: u32) -> Option<u32> {
        self.bases.borrow().get(&index).copied()
    }

    /// 存活的缓冲区数量
    pub fn live_buffers(&self) -> usize {
        self.buffers.borrow().len()
    }

    /// 累计写入次数（整体上传与局部更新）
    pub fn upload_count(&self) -> usize {
        self.uploads.get()
    }

    pub fn clear_upload_count(&self) {
        self.uploads.set(0);
    }
}

impl BufferBackend for HeadlessBackend {
    fn create_buffer(&self, buffer_type: BufferType) -> u32 {
        let handle = self.next_handle.get() + 1;
        self.next_handle.set(handle);
        self.buffers.borrow_mut().insert(
            handle,
            HeadlessBuffer {
                buffer_type,
                usage: None,
                data: Vec::new(),
            },
        );
        handle
    }

    fn upload(&self, handle: u32, data: &[u8], usage: BufferUsage) {
        if let Some(buffer) = self.buffers.borrow_mut().get_mut(&handle) {
            buffer.data.clear();
            buffer.data.extend_from_slice(data);
            buffer.usage = Some(usage);
            self.uploads.set(self.uploads.get() + 1);
        }
    }

    fn update_region(&self, handle: u32, offset: usize, data: &[u8]) {
        let mut buffers = self.buffers.borrow_mut();
        let Some(buffer) = buffers.get_mut(&handle) else {
            return;
        };
        let Some(end) = offset.checked_add(data.len()) else {
            return;
        };
        if let Some(target) = buffer.data.get_mut(offset..end) {
            target.copy_from_slice(data);
            self.uploads.set(self.uploads.get() + 1);
        }
    }

    fn bind_base(&self, handle: u32, index: u32) {
        self.bases.borrow_mut().insert(index, handle);
    }

    fn delete_buffer(&self, handle: u32) {
        self.buffers.borrow_mut().remove(&handle);
        self.bases.borrow_mut().retain(|_, bound| *bound != handle);
    }

    fn backend_name(&self) -> &str {
        "headless"
    }
}
