//! 缓冲区资源
//!
//! RAII 包装：缓冲区随持有它的组件一起销毁。
//! 以 [`BufferType::Undefined`] 创建的缓冲区只记录一条警告，其句柄永远无效，
//! 之后对它的任何操作都按误用错误处理（记录错误，空操作）。
//! 只有 [`BufferType::Storage`] 缓冲区可以绑定到 base 索引。

use std::fmt;
use std::rc::Rc;

use super::BufferBackend;
use crate::core::error::MisuseError;
use crate::{engine_error, engine_warn};

/// 缓冲区使用类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferType {
    /// 未定义类型，不会创建底层缓冲区
    Undefined,
    /// 顶点缓冲区
    Vertex,
    /// 索引缓冲区
    Index,
    /// 常量缓冲区（Uniform Buffer）
    Uniform,
    /// 存储缓冲区（Storage Buffer）
    Storage,
}

/// 上传时的用途提示，后端据此选择内存策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    /// 每帧都会重写
    Stream,
    /// 经常更新
    #[default]
    Often,
    /// 基本不变
    Rarely,
}

/// 局部更新的一段区域
#[derive(Debug, Clone, Copy)]
pub struct UpdateRegion<'a> {
    /// 写入起点（字节）
    pub offset: usize,
    /// 写入的内容
    pub data: &'a [u8],
}

impl<'a> UpdateRegion<'a> {
    pub fn new(offset: usize, data: &'a [u8]) -> Self {
        Self { offset, data }
    }
}

/// 持有后端句柄的缓冲区
pub struct Buffer {
    backend: Rc<dyn BufferBackend>,
    handle: u32,
    buffer_type: BufferType,
    size: usize,
}

impl Buffer {
    /// 创建缓冲区
    pub fn new(backend: Rc<dyn BufferBackend>, buffer_type: BufferType) -> Self {
        let handle = if buffer_type == BufferType::Undefined {
            engine_warn!("Tried to create a buffer of UNDEFINED type");
            0
        } else {
            backend.create_buffer(buffer_type)
        };

        if handle == 0 && buffer_type != BufferType::Undefined {
            engine_error!(
                backend = backend.backend_name(),
                buffer_type = ?buffer_type,
                "Backend failed to create buffer"
            );
        }

        Self {
            backend,
            handle,
            buffer_type,
            size: 0,
        }
    }

    /// 创建缓冲区并立即上传初始内容
    pub fn with_data(
        backend: Rc<dyn BufferBackend>,
        buffer_type: BufferType,
        data: &[u8],
        usage: BufferUsage,
    ) -> Self {
        let mut buffer = Self::new(backend, buffer_type);
        buffer.upload(data, usage);
        buffer
    }

    /// 底层句柄是否有效
    pub fn is_valid(&self) -> bool {
        self.handle != 0
    }

    /// 底层句柄，无效时为 0
    pub fn handle(&self) -> u32 {
        self.handle
    }

    pub fn buffer_type(&self) -> BufferType {
        self.buffer_type
    }

    /// 最近一次上传的字节数
    pub fn size(&self) -> usize {
        self.size
    }

    /// 覆盖写入缓冲区内容
    ///
    /// 无效缓冲区上调用时记录误用错误，不做任何事。
    pub fn upload(&mut self, data: &[u8], usage: BufferUsage) {
        if !self.assert_valid() {
            return;
        }

        self.backend.upload(self.handle, data, usage);
        self.size = data.len();
    }

    /// 局部更新
    ///
    /// 超出当前大小的区域记录误用错误并跳过，其余区域照常写入。
    pub fn partial_update(&mut self, regions: &[UpdateRegion<'_>]) {
        if !self.assert_valid() {
            return;
        }

        for region in regions {
            let end = region.offset.saturating_add(region.data.len());
            if end > self.size {
                let err = MisuseError::RegionOutOfBounds {
                    handle: self.handle,
                    offset: region.offset,
                    end,
                    size: self.size,
                };
                engine_error!("{}", err);
                continue;
            }
            self.backend.update_region(self.handle, region.offset, region.data);
        }
    }

    /// 绑定到着色器的 base 索引，仅限存储缓冲区
    pub fn bind_base(&self, index: u32) {
        if !self.assert_valid() {
            return;
        }

        if self.buffer_type != BufferType::Storage {
            let err = MisuseError::NotStorageBuffer(self.handle);
            engine_error!("{}", err);
            return;
        }

        self.backend.bind_base(self.handle, index);
    }

    fn assert_valid(&self) -> bool {
        if self.is_valid() {
            return true;
        }

        let err = MisuseError::InvalidResource(format!("{:?} buffer", self.buffer_type));
        engine_error!("{}", err);
        false
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if !self.is_valid() {
            return;
        }
        self.backend.delete_buffer(self.handle);
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("backend", &self.backend.backend_name())
            .field("handle", &self.handle)
            .field("buffer_type", &self.buffer_type)
            .field("size", &self.size)
            .finish()
    }
}
