//! 类型身份
//!
//! 内核只把服务类型和实现类型当作可比较的不透明身份，不依赖运行时反射。

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 可以直接构造的具体类型
    Concrete,
    /// 服务契约（trait 对象等），不能直接构造
    Abstract,
}

/// 类型信息
///
/// 相等性与哈希只取决于完整类型名，种类仅用于注册期校验。
#[derive(Clone)]
pub struct TypeInfo {
    full_name: Arc<str>,
    kind: TypeKind,
}

impl TypeInfo {
    /// 从具体类型获取类型信息
    pub fn of<T: 'static>() -> Self {
        Self {
            full_name: Arc::from(std::any::type_name::<T>()),
            kind: TypeKind::Concrete,
        }
    }

    /// 从服务契约获取类型信息，通常是 `dyn Trait`
    pub fn contract<T: ?Sized + 'static>() -> Self {
        Self {
            full_name: Arc::from(std::any::type_name::<T>()),
            kind: TypeKind::Abstract,
        }
    }

    /// 从类型名称创建具体类型信息（用于配置）
    pub fn named(name: impl AsRef<str>) -> Self {
        Self {
            full_name: Arc::from(name.as_ref()),
            kind: TypeKind::Concrete,
        }
    }

    /// 从类型名称创建契约类型信息（用于配置）
    pub fn named_contract(name: impl AsRef<str>) -> Self {
        Self {
            full_name: Arc::from(name.as_ref()),
            kind: TypeKind::Abstract,
        }
    }

    /// 完整类型名
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &str {
        let name = self.full_name.trim_start_matches("dyn ");
        let base = name.split('<').next().unwrap_or(name);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// 类型种类
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 是否为可直接构造的具体类型
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.full_name == other.full_name
    }
}

impl Eq for TypeInfo {}

impl Hash for TypeInfo {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.full_name.hash(state);
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeInfo({})", self.full_name)
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
