//! 解析上下文
//!
//! 上下文随一次解析调用按值传递。解析栈是不可变的链表，`enter` 返回追加了一帧的新上下文，
//! 兄弟分支之间互不可见，并发的无关解析也不会共享任何可变状态。

use microkernel_common::{ComponentInstance, KernelError, KernelResult};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 调用方为单次解析显式提供的依赖值（依赖键 → 实例）
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: HashMap<String, ComponentInstance>,
}

impl Arguments {
    /// 创建空参数集合
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加参数（链式）
    pub fn with(mut self, dependency_key: impl Into<String>, value: ComponentInstance) -> Self {
        self.insert(dependency_key, value);
        self
    }

    /// 添加参数
    pub fn insert(&mut self, dependency_key: impl Into<String>, value: ComponentInstance) {
        self.values.insert(dependency_key.into(), value);
    }

    /// 获取参数
    pub fn get(&self, dependency_key: &str) -> Option<&ComponentInstance> {
        self.values.get(dependency_key)
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

struct Frame {
    key: String,
    parent: Option<Arc<Frame>>,
}

/// 创建上下文
#[derive(Clone, Default)]
pub struct CreationContext {
    stack: Option<Arc<Frame>>,
    depth: usize,
    arguments: Option<Arc<Arguments>>,
}

impl CreationContext {
    /// 创建空上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带显式参数的上下文，参数只作用于本次解析的根组件
    pub fn with_arguments(arguments: Arguments) -> Self {
        Self {
            arguments: (!arguments.is_empty()).then(|| Arc::new(arguments)),
            ..Self::default()
        }
    }

    /// 进入组件 `key` 的解析，返回追加了该键的新上下文
    ///
    /// 键已在栈上时返回 [`KernelError::CircularDependency`]，路径以重复出现的键结尾。
    pub fn enter(&self, key: &str, max_depth: usize) -> KernelResult<Self> {
        if self.contains(key) {
            let mut path = self.path();
            path.push(key.to_string());
            return Err(KernelError::CircularDependency {
                key: key.to_string(),
                path,
            });
        }

        if self.depth >= max_depth {
            let mut path = self.path();
            path.push(key.to_string());
            return Err(KernelError::ResolutionDepthExceeded { max_depth, path });
        }

        Ok(Self {
            stack: Some(Arc::new(Frame {
                key: key.to_string(),
                parent: self.stack.clone(),
            })),
            depth: self.depth + 1,
            // 嵌套组件看不到根组件的参数
            arguments: if self.stack.is_none() {
                self.arguments.clone()
            } else {
                None
            },
        })
    }

    /// 键是否在当前解析栈上
    pub fn contains(&self, key: &str) -> bool {
        self.frames().any(|frame| frame.key == key)
    }

    /// 当前正在解析的组件键
    pub fn current(&self) -> Option<&str> {
        self.stack.as_deref().map(|frame| frame.key.as_str())
    }

    /// 解析路径，从根组件开始
    pub fn path(&self) -> Vec<String> {
        let mut path: Vec<String> = self.frames().map(|frame| frame.key.clone()).collect();
        path.reverse();
        path
    }

    /// 解析深度
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// 获取调用方提供的参数
    pub fn argument(&self, dependency_key: &str) -> Option<&ComponentInstance> {
        self.arguments.as_deref().and_then(|args| args.get(dependency_key))
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(self.stack.as_deref(), |frame| frame.parent.as_deref())
    }
}

impl fmt::Debug for CreationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreationContext")
            .field("path", &self.path())
            .field("depth", &self.depth)
            .field("has_arguments", &self.arguments.is_some())
            .finish()
    }
}
