//! ### English
//! Consumer bindings: how a renderer reaches the consumer-side frame handler.
//!
//! ### 中文
//! 消费者绑定：渲染器如何找到消费者侧的帧处理函数。

use std::fmt;
use std::sync::Arc;

use crate::engine::error::ConsumerFault;
use crate::engine::frame::FrameBufferView;
use crate::engine::sequence::RendererId;

/// ### English
/// Method name looked up on script controller objects when no other name is given.
///
/// ### 中文
/// 未指定其它名称时，在脚本控制器对象上查找的方法名。
pub const DEFAULT_FRAME_METHOD: &str = "updateRendererFrameBuffer";

/// ### English
/// A consumer-side callable that receives frames.
///
/// Implementations must finish with the view (copy or upload) before returning.
///
/// ### 中文
/// 接收帧的消费者侧可调用对象。
///
/// 实现必须在返回前用完视图（拷贝或上传）。
pub trait FrameCallable: Send + Sync {
    fn call(&self, renderer: RendererId, frame: FrameBufferView<'_>) -> Result<(), ConsumerFault>;

    /// ### English
    /// Returns `false` once the underlying consumer object has become invalid.
    ///
    /// ### 中文
    /// 底层消费者对象失效后返回 `false`。
    fn is_callable(&self) -> bool {
        true
    }
}

impl<F> FrameCallable for F
where
    F: Fn(RendererId, FrameBufferView<'_>) -> Result<(), ConsumerFault> + Send + Sync,
{
    fn call(&self, renderer: RendererId, frame: FrameBufferView<'_>) -> Result<(), ConsumerFault> {
        self(renderer, frame)
    }
}

/// ### English
/// A consumer-side object exposing frame handlers by name (e.g. a script controller).
///
/// ### 中文
/// 以名称暴露帧处理函数的消费者侧对象（例如脚本控制器）。
pub trait ConsumerTarget: Send + Sync {
    /// ### English
    /// Looks up `method`. `None` means the object has no callable under that name (any more).
    ///
    /// ### 中文
    /// 查找 `method`。返回 `None` 表示该对象（已）没有同名可调用成员。
    fn resolve(&self, method: &str) -> Option<Arc<dyn FrameCallable>>;
}

/// ### English
/// When a named method is looked up on its target.
///
/// ### 中文
/// 何时在目标对象上查找命名方法。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BindingResolution {
    /// ### English
    /// Once, at bind time (the runtime hands out stable handles).
    ///
    /// ### 中文
    /// 绑定时查找一次（运行时提供稳定句柄）。
    Stable,
    /// ### English
    /// On every delivery, inside the consumer's calling scope.
    ///
    /// ### 中文
    /// 每次投递时在消费者调用作用域内查找。
    #[default]
    PerCall,
}

enum Handler {
    Callable(Arc<dyn FrameCallable>),
    Stable {
        method: String,
        resolved: Option<Arc<dyn FrameCallable>>,
    },
    PerCall {
        target: Arc<dyn ConsumerTarget>,
        method: String,
    },
}

/// ### English
/// One registered consumer handler. Replaced as a whole by `bind`; never mutated in place.
///
/// ### 中文
/// 一个已注册的消费者处理器。由 `bind` 整体替换；不会原地修改。
pub struct ConsumerBinding {
    handler: Handler,
}

impl ConsumerBinding {
    /// ### English
    /// Binds a Rust closure.
    ///
    /// ### 中文
    /// 绑定一个 Rust 闭包。
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(RendererId, FrameBufferView<'_>) -> Result<(), ConsumerFault> + Send + Sync + 'static,
    {
        Self::callable(Arc::new(f))
    }

    pub fn callable(callable: Arc<dyn FrameCallable>) -> Self {
        Self {
            handler: Handler::Callable(callable),
        }
    }

    /// ### English
    /// Binds `method` on `target` with the given resolution strategy.
    ///
    /// With [`BindingResolution::Stable`] the lookup runs here, once; a failed lookup still
    /// produces a binding (deliveries then drop with `InvalidBinding`).
    ///
    /// ### 中文
    /// 以指定的查找策略绑定 `target` 上的 `method`。
    ///
    /// 使用 [`BindingResolution::Stable`] 时在此处查找一次；查找失败仍会生成绑定
    /// （之后的投递以 `InvalidBinding` 丢弃）。
    pub fn method(
        target: Arc<dyn ConsumerTarget>,
        method: impl Into<String>,
        resolution: BindingResolution,
    ) -> Self {
        let method = method.into();
        let handler = match resolution {
            BindingResolution::Stable => {
                let resolved = target.resolve(&method);
                Handler::Stable { method, resolved }
            }
            BindingResolution::PerCall => Handler::PerCall { target, method },
        };
        Self { handler }
    }

    /// ### English
    /// Binds a script controller: [`DEFAULT_FRAME_METHOD`], looked up per call.
    ///
    /// ### 中文
    /// 绑定脚本控制器：每次调用时查找 [`DEFAULT_FRAME_METHOD`]。
    pub fn controller(target: Arc<dyn ConsumerTarget>) -> Self {
        Self::method(target, DEFAULT_FRAME_METHOD, BindingResolution::PerCall)
    }

    /// ### English
    /// Resolves the callable for one delivery; `None` means the binding is no longer callable.
    /// Must run inside the consumer's calling scope (per-call lookups touch consumer state).
    ///
    /// ### 中文
    /// 为一次投递解析可调用对象；`None` 表示绑定已不可调用。
    /// 必须在消费者调用作用域内执行（逐次查找会访问消费者状态）。
    pub(crate) fn resolve(&self) -> Option<Arc<dyn FrameCallable>> {
        let callable = match &self.handler {
            Handler::Callable(callable) => Some(callable.clone()),
            Handler::Stable { resolved, .. } => resolved.clone(),
            Handler::PerCall { target, method } => target.resolve(method),
        }?;
        callable.is_callable().then_some(callable)
    }
}

impl fmt::Debug for ConsumerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.handler {
            Handler::Callable(_) => f.write_str("ConsumerBinding::Callable"),
            Handler::Stable { method, resolved } => f
                .debug_struct("ConsumerBinding::Stable")
                .field("method", method)
                .field("resolved", &resolved.is_some())
                .finish(),
            Handler::PerCall { method, .. } => f
                .debug_struct("ConsumerBinding::PerCall")
                .field("method", method)
                .finish(),
        }
    }
}
