//! 组件弱引用句柄
//!
//! 组件之间的依赖关系是"关联"而非"拥有"：依赖句柄不会延长被依赖组件的生命周期。
//! 被依赖的组件被移除后，句柄失效，之后的每次访问都会记录一条误用错误并返回 `None`。

use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use crate::core::error::MisuseError;
use crate::engine_error;

/// 对共享组件（或其他资源）的非拥有引用
///
/// 相等性与哈希基于指向的对象身份，比较时不会把句柄提升为强引用。
pub struct ResourceRef<T> {
    inner: Weak<RefCell<T>>,
}

impl<T: 'static> ResourceRef<T> {
    /// 从共享引用创建弱句柄
    pub fn new(shared: &Rc<RefCell<T>>) -> Self {
        Self {
            inner: Rc::downgrade(shared),
        }
    }

    /// 创建一个永远无效的句柄
    pub fn empty() -> Self {
        Self { inner: Weak::new() }
    }

    /// 引用的资源是否仍然存在
    pub fn is_valid(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// 临时提升为强引用
    ///
    /// 资源已被销毁时记录误用错误并返回 `None`。
    pub fn upgrade(&self) -> Option<Rc<RefCell<T>>> {
        match self.inner.upgrade() {
            Some(shared) => Some(shared),
            None => {
                report_invalid::<T>("expired");
                None
            }
        }
    }

    /// 以只读方式访问资源
    ///
    /// 资源已失效或正被可变借用时返回 `None`，操作为空操作。
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let shared = self.upgrade()?;
        let result = match shared.try_borrow() {
            Ok(value) => Some(f(&value)),
            Err(_) => {
                report_invalid::<T>("already mutably borrowed");
                None
            }
        };
        result
    }

    /// 以可变方式访问资源
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let shared = self.upgrade()?;
        let result = match shared.try_borrow_mut() {
            Ok(mut value) => Some(f(&mut value)),
            Err(_) => {
                report_invalid::<T>("already borrowed");
                None
            }
        };
        result
    }
}

fn report_invalid<T>(reason: &str) {
    let err = MisuseError::InvalidResource(format!(
        "{} ({})",
        std::any::type_name::<T>(),
        reason
    ));
    engine_error!("{}", err);
}

impl<T> Clone for ResourceRef<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> PartialEq for ResourceRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

impl<T> Eq for ResourceRef<T> {}

impl<T> Hash for ResourceRef<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.inner.as_ptr() as *const () as usize).hash(state);
    }
}

impl<T> fmt::Debug for ResourceRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("type", &std::any::type_name::<T>())
            .field("valid", &(self.inner.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_valid_access() {
        let shared = Rc::new(RefCell::new(5u32));
        let handle = ResourceRef::new(&shared);

        assert!(handle.is_valid());
        assert_eq!(handle.with(|v| *v), Some(5));
        handle.with_mut(|v| *v = 9);
        assert_eq!(*shared.borrow(), 9);
    }

    #[test]
    fn test_expired_access_is_noop() {
        let shared = Rc::new(RefCell::new(String::from("camera")));
        let handle = ResourceRef::new(&shared);
        drop(shared);

        assert!(!handle.is_valid());
        assert!(handle.with(|s| s.len()).is_none());
        assert!(handle.with_mut(|s| s.push('!')).is_none());
        assert!(handle.upgrade().is_none());
    }

    #[test]
    fn test_does_not_extend_lifetime() {
        let shared = Rc::new(RefCell::new(1i32));
        let handle = ResourceRef::new(&shared);
        assert_eq!(Rc::strong_count(&shared), 1);
        assert_eq!(handle.with(|v| *v), Some(1));
        assert_eq!(Rc::strong_count(&shared), 1);
    }

    #[test]
    fn test_borrow_conflict_is_reported() {
        let shared = Rc::new(RefCell::new(0u8));
        let handle = ResourceRef::new(&shared);
        let _guard = shared.borrow_mut();
        assert!(handle.with(|v| *v).is_none());
    }

    #[test]
    fn test_identity_equality_and_hash() {
        let a = Rc::new(RefCell::new(1));
        let b = Rc::new(RefCell::new(1));
        let ha = ResourceRef::new(&a);

        assert_eq!(ha, ha.clone());
        assert_ne!(ha, ResourceRef::new(&b));

        let mut set = HashSet::new();
        set.insert(ha.clone());
        set.insert(ResourceRef::new(&a));
        set.insert(ResourceRef::new(&b));
        assert_eq!(set.len(), 2);

        assert!(!ResourceRef::<i32>::empty().is_valid());
    }
}
