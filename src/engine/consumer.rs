//! ### English
//! Consumer runtime contract and the invocation discipline every delivery goes through.
//!
//! ### 中文
//! 消费者运行时契约，以及每次投递都要遵循的调用规程。

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::engine::binding::ConsumerBinding;
use crate::engine::error::{ConsumerFault, DropReason};
use crate::engine::frame::FrameBufferView;
use crate::engine::sequence::RendererId;

/// ### English
/// The consumer runtime as seen by the relay: its threading contract, its calling-context scope,
/// and its pending-error state.
///
/// All hooks default to no-ops, which describes a runtime that accepts calls from any thread.
///
/// ### 中文
/// 中继视角下的消费者运行时：线程契约、调用上下文作用域以及待处理错误状态。
///
/// 所有钩子默认为空操作，表示运行时可接受任意线程的调用。
pub trait ConsumerRuntime: Send + Sync {
    /// ### English
    /// Whether handlers may be invoked directly from producer threads (inside `enter`/`leave`).
    /// If `false`, frames are parked and delivered on the consumer's own turn.
    ///
    /// ### 中文
    /// 是否允许在生产者线程上直接调用处理函数（在 `enter`/`leave` 之间）。
    /// 为 `false` 时，帧会被暂存，并在消费者自己的调度轮次中投递。
    fn supports_foreign_threads(&self) -> bool {
        true
    }

    /// ### English
    /// Acquires the runtime's calling context (engine lock / handle scope).
    ///
    /// ### 中文
    /// 获取运行时的调用上下文（引擎锁 / handle scope）。
    fn enter(&self) {}

    /// ### English
    /// Releases what `enter` acquired. Called exactly once per `enter`, also on failure.
    ///
    /// ### 中文
    /// 释放 `enter` 获取的上下文。每次 `enter` 恰好调用一次，失败时也会调用。
    fn leave(&self) {}

    /// ### English
    /// Discards error state left behind by an earlier call.
    ///
    /// ### 中文
    /// 丢弃此前调用遗留的错误状态。
    fn clear_pending_error(&self) {}

    /// ### English
    /// Takes an error the handler raised through the runtime rather than its return value.
    ///
    /// ### 中文
    /// 取出处理函数通过运行时（而非返回值）抛出的错误。
    fn take_pending_error(&self) -> Option<ConsumerFault> {
        None
    }
}

/// ### English
/// Runtime that accepts calls from any thread and needs no scope.
///
/// ### 中文
/// 可接受任意线程调用且无需作用域的运行时。
#[derive(Clone, Copy, Debug, Default)]
pub struct ReentrantRuntime;

impl ConsumerRuntime for ReentrantRuntime {}

/// ### English
/// RAII guard for one `enter`/`leave` pair.
///
/// ### 中文
/// 单次 `enter`/`leave` 配对的 RAII 守卫。
struct CallScope<'a> {
    runtime: &'a dyn ConsumerRuntime,
}

impl<'a> CallScope<'a> {
    fn enter(runtime: &'a dyn ConsumerRuntime) -> Self {
        runtime.enter();
        Self { runtime }
    }
}

impl Drop for CallScope<'_> {
    fn drop(&mut self) {
        self.runtime.leave();
    }
}

/// ### English
/// Result of invoking a binding once.
///
/// ### 中文
/// 单次调用绑定的结果。
pub(crate) enum Invocation {
    Handled,
    Unresolved,
    Faulted(ConsumerFault),
}

#[cfg(test)]
impl Invocation {
    fn drop_reason(&self) -> Option<DropReason> {
        match self {
            Self::Handled => None,
            Self::Unresolved => Some(DropReason::InvalidBinding),
            Self::Faulted(_) => Some(DropReason::ConsumerError),
        }
    }
}

/// ### English
/// Invokes `binding` once with `frame`:
///
/// 1. enters the calling scope (left again on every exit path),
/// 2. clears stale runtime errors,
/// 3. resolves the handler and calls it,
/// 4. checks the runtime for an error raised during the call.
///
/// Every runtime hook runs between `enter` and `leave`. The whole sequence runs under
/// `catch_unwind`, so a panic in the handler or in a runtime hook becomes a fault and never
/// reaches the caller.
///
/// ### 中文
/// 使用 `frame` 调用一次 `binding`：
///
/// 1. 进入调用作用域（任何退出路径都会离开）；
/// 2. 清除遗留的运行时错误；
/// 3. 解析处理函数并调用；
/// 4. 检查运行时在调用期间是否抛出了错误。
///
/// 所有运行时钩子都在 `enter` 与 `leave` 之间执行。整个过程位于 `catch_unwind` 之内，
/// 处理函数或运行时钩子中的 panic 都会变为错误，不会到达调用方。
pub(crate) fn invoke(
    runtime: &dyn ConsumerRuntime,
    binding: &ConsumerBinding,
    renderer: RendererId,
    frame: FrameBufferView<'_>,
) -> Invocation {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let _scope = CallScope::enter(runtime);
        runtime.clear_pending_error();

        let Some(callable) = binding.resolve() else {
            return Invocation::Unresolved;
        };
        match callable.call(renderer, frame) {
            Ok(()) => match runtime.take_pending_error() {
                Some(fault) => Invocation::Faulted(fault),
                None => Invocation::Handled,
            },
            Err(fault) => {
                runtime.clear_pending_error();
                Invocation::Faulted(fault)
            }
        }
    }));

    outcome.unwrap_or_else(|payload| {
        Invocation::Faulted(ConsumerFault::Panicked(panic_message(payload.as_ref())))
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::*;
    use crate::engine::frame::FrameMetadata;

    /// Runtime double recording hook calls and holding a pending-error slot.
    /// Error-state hooks count calls made while no scope is held.
    #[derive(Default)]
    struct ScriptRuntime {
        depth: AtomicUsize,
        enters: AtomicUsize,
        leaves: AtomicUsize,
        unscoped: AtomicUsize,
        panic_on_take: AtomicBool,
        pending: Mutex<Option<ConsumerFault>>,
    }

    impl ScriptRuntime {
        fn raise(&self, msg: &str) {
            *self.pending.lock() = Some(ConsumerFault::raised(msg));
        }

        fn check_scope(&self) {
            if self.depth.load(Ordering::SeqCst) != 1 {
                self.unscoped.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl ConsumerRuntime for ScriptRuntime {
        fn enter(&self) {
            self.depth.fetch_add(1, Ordering::SeqCst);
            self.enters.fetch_add(1, Ordering::SeqCst);
        }

        fn leave(&self) {
            self.depth.fetch_sub(1, Ordering::SeqCst);
            self.leaves.fetch_add(1, Ordering::SeqCst);
        }

        fn clear_pending_error(&self) {
            self.check_scope();
            self.pending.lock().take();
        }

        fn take_pending_error(&self) -> Option<ConsumerFault> {
            self.check_scope();
            if self.panic_on_take.load(Ordering::SeqCst) {
                panic!("engine state corrupted");
            }
            self.pending.lock().take()
        }
    }

    fn id() -> RendererId {
        crate::engine::sequence::SequenceAllocator::new().next()
    }

    fn frame(bytes: &[u8]) -> FrameBufferView<'_> {
        FrameBufferView::new(bytes, FrameMetadata::default())
    }

    #[test]
    fn handler_runs_inside_the_scope() {
        let runtime = Arc::new(ScriptRuntime::default());
        let observed = runtime.clone();
        let binding = ConsumerBinding::from_fn(move |_, _| {
            assert_eq!(observed.depth.load(Ordering::SeqCst), 1);
            Ok(())
        });

        let result = invoke(runtime.as_ref(), &binding, id(), frame(&[1, 2, 3]));
        assert!(matches!(result, Invocation::Handled));
        assert_eq!(runtime.depth.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn scope_is_left_when_the_handler_panics() {
        let runtime = ScriptRuntime::default();
        let binding = ConsumerBinding::from_fn(|_, _| panic!("texture upload failed"));

        let result = invoke(&runtime, &binding, id(), frame(&[0]));
        match result {
            Invocation::Faulted(ConsumerFault::Panicked(msg)) => {
                assert_eq!(msg, "texture upload failed")
            }
            _ => panic!("panic was not absorbed as a fault"),
        }
        assert_eq!(runtime.enters.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.leaves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_raised_through_the_runtime_is_a_fault() {
        let runtime = Arc::new(ScriptRuntime::default());
        let script = runtime.clone();
        let binding = ConsumerBinding::from_fn(move |_, _| {
            script.raise("TypeError: texture is undefined");
            Ok(())
        });

        let result = invoke(runtime.as_ref(), &binding, id(), frame(&[0]));
        assert_eq!(result.drop_reason(), Some(DropReason::ConsumerError));
    }

    #[test]
    fn stale_error_is_not_attributed_to_the_next_call() {
        let runtime = ScriptRuntime::default();
        runtime.raise("left over from an earlier call");

        let binding = ConsumerBinding::from_fn(|_, _| Ok(()));
        let result = invoke(&runtime, &binding, id(), frame(&[0]));
        assert!(matches!(result, Invocation::Handled));
    }

    #[test]
    fn unresolved_binding_still_balances_the_scope() {
        struct Gone;
        impl crate::engine::binding::ConsumerTarget for Gone {
            fn resolve(
                &self,
                _: &str,
            ) -> Option<Arc<dyn crate::engine::binding::FrameCallable>> {
                None
            }
        }

        let runtime = ScriptRuntime::default();
        let binding = ConsumerBinding::controller(Arc::new(Gone));
        let result = invoke(&runtime, &binding, id(), frame(&[0]));

        assert_eq!(result.drop_reason(), Some(DropReason::InvalidBinding));
        assert_eq!(runtime.enters.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.leaves.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn error_state_is_only_touched_inside_the_scope() {
        let runtime = ScriptRuntime::default();
        runtime.raise("left over from an earlier call");

        let ok = ConsumerBinding::from_fn(|_, _| Ok(()));
        let failing = ConsumerBinding::from_fn(|_, _| Err(ConsumerFault::raised("bad frame")));
        assert!(matches!(invoke(&runtime, &ok, id(), frame(&[0])), Invocation::Handled));
        assert_eq!(
            invoke(&runtime, &failing, id(), frame(&[0])).drop_reason(),
            Some(DropReason::ConsumerError)
        );

        assert_eq!(runtime.unscoped.load(Ordering::SeqCst), 0);
        assert_eq!(runtime.enters.load(Ordering::SeqCst), 2);
        assert_eq!(runtime.leaves.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn panicking_runtime_hook_becomes_a_fault() {
        let runtime = ScriptRuntime::default();
        runtime.panic_on_take.store(true, Ordering::SeqCst);
        let binding = ConsumerBinding::from_fn(|_, _| Ok(()));

        let result = invoke(&runtime, &binding, id(), frame(&[0]));
        match result {
            Invocation::Faulted(ConsumerFault::Panicked(msg)) => {
                assert_eq!(msg, "engine state corrupted")
            }
            _ => panic!("runtime hook panic was not absorbed"),
        }
        assert_eq!(runtime.depth.load(Ordering::SeqCst), 0);
        assert_eq!(runtime.leaves.load(Ordering::SeqCst), 1);
    }
}
