//! 组件类型标识
//!
//! 每种具体组件由其类型名的哈希值唯一标识，用于声明依赖和按类型查找。

use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 组件类型标识
///
/// 比较与哈希只使用类型名的哈希值，类型名本身仅用于诊断输出。
#[derive(Clone, Copy)]
pub struct ComponentKind {
    hash: u64,
    name: &'static str,
}

impl ComponentKind {
    /// 获取类型 `T` 的组件标识
    ///
    /// # 示例
    /// ```
    /// use dist_scene::component::{ComponentKind, Transform3D};
    ///
    /// let kind = ComponentKind::of::<Transform3D>();
    /// assert_eq!(kind.short_name(), "Transform3D");
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        let name = std::any::type_name::<T>();
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self {
            hash: hasher.finish(),
            name,
        }
    }

    /// 类型名哈希值
    pub fn hash_value(&self) -> u64 {
        self.hash
    }

    /// 完整类型名（包含模块路径）
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// 去掉模块路径的类型名，泛型参数保持原样
    pub fn short_name(&self) -> &'static str {
        let path_end = self.name.find('<').unwrap_or(self.name.len());
        let start = self.name[..path_end]
            .rfind("::")
            .map(|i| i + 2)
            .unwrap_or(0);
        &self.name[start..]
    }
}

impl PartialEq for ComponentKind {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for ComponentKind {}

impl Hash for ComponentKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

impl fmt::Debug for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentKind({}, {:#018x})", self.short_name(), self.hash)
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
