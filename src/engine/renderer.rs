//! ### English
//! Texture renderer: one per video surface; hands frames from the producer pipeline to the
//! bound consumer.
//!
//! ### 中文
//! 纹理渲染器：每个视频表面一个；把帧从生产者管线交给已绑定的消费者。

use std::sync::Arc;

use parking_lot::{ReentrantMutex, RwLock};

use crate::engine::binding::ConsumerBinding;
use crate::engine::config::DispatchMode;
use crate::engine::consumer::{self, ConsumerRuntime, Invocation};
use crate::engine::error::DropReason;
use crate::engine::frame::{FlipMode, FrameBufferView, FrameMetadata, MetadataCell, Rotation};
use crate::engine::lockfree::FrameMailbox;
use crate::engine::pending::PendingRendererQueue;
use crate::engine::sequence::{RendererId, SequenceAllocator};
use crate::engine::stats::{RendererStats, StatsSnapshot};

/// ### English
/// Outcome of one hand-off.
///
/// ### 中文
/// 单次交接的结果。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// ### English
    /// The consumer handled the frame without raising.
    ///
    /// ### 中文
    /// 消费者处理了该帧且未抛错。
    Delivered,
    /// ### English
    /// The frame was parked for the consumer's turn. `superseded` is `true` if an older parked
    /// frame was dropped in its favor.
    ///
    /// ### 中文
    /// 帧已暂存，等待消费者调度轮次。若有更旧的暂存帧因此被丢弃，`superseded` 为 `true`。
    Queued { superseded: bool },
    /// ### English
    /// The frame did not reach a consumer; the reason says why.
    ///
    /// ### 中文
    /// 帧未到达消费者；原因见 `DropReason`。
    Dropped(DropReason),
}

impl Delivery {
    #[inline]
    pub fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }

    #[inline]
    pub fn drop_reason(self) -> Option<DropReason> {
        match self {
            Self::Dropped(reason) => Some(reason),
            _ => None,
        }
    }
}

enum Dispatch {
    Direct,
    Queued {
        mailbox: FrameMailbox,
        pending: Option<Arc<PendingRendererQueue>>,
    },
}

/// ### English
/// One video surface: identity, latest metadata, and the consumer binding.
///
/// Thread-safety:
/// - `deliver` may be called from any producer thread; deliveries are serialized per renderer,
///   so the consumer observes them in call order.
/// - `bind`, `metadata` and the accessors may be called from any thread at any time.
///   `metadata` never waits for an in-flight consumer call.
///
/// ### 中文
/// 一个视频表面：标识、最新元数据以及消费者绑定。
///
/// 线程安全：
/// - `deliver` 可在任意生产者线程调用；同一渲染器的投递是串行的，消费者按调用顺序观察到它们。
/// - `bind`、`metadata` 及各访问器可在任意线程随时调用；`metadata` 不会等待进行中的消费者调用。
pub struct TextureRenderer {
    id: RendererId,
    metadata: MetadataCell,
    binding: RwLock<Option<Arc<ConsumerBinding>>>,
    runtime: Arc<dyn ConsumerRuntime>,
    dispatch: Dispatch,
    /// ### English
    /// Serializes `deliver` across threads: metadata update + hand-off form one critical section.
    /// Reentrant, so a handler may deliver to its own renderer.
    ///
    /// ### 中文
    /// 在线程间串行化 `deliver`：元数据更新与交接构成同一个临界区。
    /// 可重入，处理函数可以向自身所在的渲染器投递。
    delivery: ReentrantMutex<()>,
    /// ### English
    /// Serializes `drain` across threads so parked frames reach the consumer in order.
    ///
    /// ### 中文
    /// 在线程间串行化 `drain`，保证暂存帧按顺序到达消费者。
    drain: ReentrantMutex<()>,
    stats: RendererStats,
}

impl TextureRenderer {
    /// ### English
    /// Creates a standalone renderer with a fresh identity from `sequence`.
    ///
    /// Dispatch is picked from the runtime's threading contract. A queued standalone renderer is
    /// drained by calling [`Self::drain`] on the consumer's turn.
    ///
    /// ### 中文
    /// 使用 `sequence` 分配的新标识创建一个独立渲染器。
    ///
    /// 分发方式由运行时的线程契约决定。独立的排队式渲染器需在消费者调度轮次调用 [`Self::drain`]。
    pub fn new(sequence: &SequenceAllocator, runtime: Arc<dyn ConsumerRuntime>) -> Self {
        let mode = DispatchMode::Auto.resolve(runtime.as_ref());
        Self::with_dispatch(sequence.next(), runtime, mode, None)
    }

    /// ### English
    /// `mode` must already be resolved (`Direct` or `Queued`).
    ///
    /// ### 中文
    /// `mode` 必须已解析（`Direct` 或 `Queued`）。
    pub(crate) fn with_dispatch(
        id: RendererId,
        runtime: Arc<dyn ConsumerRuntime>,
        mode: DispatchMode,
        pending: Option<Arc<PendingRendererQueue>>,
    ) -> Self {
        let dispatch = match mode {
            DispatchMode::Direct => Dispatch::Direct,
            DispatchMode::Auto | DispatchMode::Queued => Dispatch::Queued {
                mailbox: FrameMailbox::default(),
                pending,
            },
        };
        Self {
            id,
            metadata: MetadataCell::default(),
            binding: RwLock::new(None),
            runtime,
            dispatch,
            delivery: ReentrantMutex::new(()),
            drain: ReentrantMutex::new(()),
            stats: RendererStats::default(),
        }
    }

    #[inline]
    pub fn identity(&self) -> RendererId {
        self.id
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        match self.dispatch {
            Dispatch::Direct => DispatchMode::Direct,
            Dispatch::Queued { .. } => DispatchMode::Queued,
        }
    }

    /// ### English
    /// Replaces the consumer binding; `None` clears it.
    ///
    /// A delivery already in flight finishes with the binding it started with.
    ///
    /// ### 中文
    /// 替换消费者绑定；传入 `None` 表示清除。
    ///
    /// 已在进行中的投递会使用其开始时的绑定完成。
    pub fn bind(&self, binding: Option<ConsumerBinding>) {
        let binding = binding.map(Arc::new);
        tracing::debug!(renderer = %self.id, bound = binding.is_some(), "consumer binding replaced");
        let previous = std::mem::replace(&mut *self.binding.write(), binding);
        drop(previous);
    }

    #[inline]
    pub fn unbind(&self) {
        self.bind(None);
    }

    pub fn is_bound(&self) -> bool {
        self.binding.read().is_some()
    }

    /// ### English
    /// Hands one frame to the consumer.
    ///
    /// Cached metadata is replaced first (also when the frame is dropped). `bytes` is only
    /// borrowed for the duration of this call.
    ///
    /// - Direct dispatch: the handler runs now, on this thread, and has returned when this does.
    /// - Queued dispatch: a copy is parked; returns [`Delivery::Queued`].
    ///
    /// Never fails toward the caller; problems become [`Delivery::Dropped`].
    ///
    /// Calls from other threads wait for an in-flight delivery. A handler calling `deliver` on
    /// its own renderer runs the nested delivery immediately, before the outer call returns.
    ///
    /// ### 中文
    /// 把一帧交给消费者。
    ///
    /// 先替换缓存的元数据（即使该帧被丢弃也会替换）。`bytes` 仅在本次调用期间被借用。
    ///
    /// - 直接分发：处理函数在当前线程立即执行，本函数返回时它已返回。
    /// - 排队分发：暂存一份副本；返回 [`Delivery::Queued`]。
    ///
    /// 不会向调用方报错；问题会转换为 [`Delivery::Dropped`]。
    ///
    /// 其它线程的调用会等待进行中的投递。处理函数对自身渲染器调用 `deliver` 时，
    /// 嵌套投递会立即执行，先于外层调用返回。
    pub fn deliver(&self, bytes: &[u8], metadata: FrameMetadata) -> Delivery {
        let _serial = self.delivery.lock();
        self.metadata.store(metadata);

        match &self.dispatch {
            Dispatch::Direct => {
                let Some(binding) = self.current_binding() else {
                    return self.dropped(DropReason::NoConsumer);
                };
                self.invoke(&binding, FrameBufferView::new(bytes, metadata))
            }
            Dispatch::Queued { mailbox, pending } => {
                if !self.is_bound() {
                    return self.dropped(DropReason::NoConsumer);
                }

                let superseded = mailbox.post(metadata, bytes);
                self.stats.record_queued(superseded);
                if superseded {
                    tracing::trace!(renderer = %self.id, "undelivered frame superseded");
                } else if let Some(pending) = pending {
                    if !pending.push(self.id) {
                        tracing::debug!(renderer = %self.id, "pending queue full; next pump scans all renderers");
                    }
                }
                Delivery::Queued { superseded }
            }
        }
    }

    /// ### English
    /// Delivers the parked frame, if any (queued dispatch; call on the consumer's turn).
    ///
    /// Returns `None` when nothing is parked (always `None` for direct dispatch). A handler may
    /// call `drain` or `deliver` on its own renderer without blocking.
    ///
    /// ### 中文
    /// 投递暂存的帧（若有）（排队分发；在消费者调度轮次调用）。
    ///
    /// 没有暂存帧时返回 `None`（直接分发时始终为 `None`）。处理函数可以对自身渲染器调用
    /// `drain` 或 `deliver` 而不会阻塞。
    pub fn drain(&self) -> Option<Delivery> {
        let Dispatch::Queued { mailbox, .. } = &self.dispatch else {
            return None;
        };
        if !mailbox.is_pending() {
            return None;
        }

        let _turn = self.drain.lock();
        let frame = mailbox.take()?;
        let outcome = match self.current_binding() {
            Some(binding) => {
                self.invoke(&binding, FrameBufferView::new(&frame.bytes, frame.metadata))
            }
            None => self.dropped(DropReason::NoConsumer),
        };
        mailbox.recycle(frame);
        Some(outcome)
    }

    /// ### English
    /// Metadata of the most recently delivered frame (never torn, never blocks on a delivery).
    ///
    /// ### 中文
    /// 最近一次投递帧的元数据（不会撕裂，也不会因投递而阻塞）。
    #[inline]
    pub fn metadata(&self) -> FrameMetadata {
        self.metadata.load()
    }

    pub fn width(&self) -> u32 {
        self.metadata().width()
    }

    pub fn height(&self) -> u32 {
        self.metadata().height()
    }

    pub fn rotation(&self) -> Rotation {
        self.metadata().rotation
    }

    pub fn flip_mode(&self) -> FlipMode {
        self.metadata().flip
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    fn current_binding(&self) -> Option<Arc<ConsumerBinding>> {
        self.binding.read().clone()
    }

    fn invoke(&self, binding: &ConsumerBinding, frame: FrameBufferView<'_>) -> Delivery {
        match consumer::invoke(self.runtime.as_ref(), binding, self.id, frame) {
            Invocation::Handled => {
                self.stats.record_delivered();
                Delivery::Delivered
            }
            Invocation::Unresolved => self.dropped(DropReason::InvalidBinding),
            Invocation::Faulted(fault) => {
                let streak = self.stats.record_dropped(DropReason::ConsumerError);
                if streak == 1 {
                    tracing::warn!(renderer = %self.id, %fault, "consumer raised; dropping frames until it recovers");
                } else {
                    tracing::debug!(renderer = %self.id, %fault, streak, "consumer raised; frame dropped");
                }
                Delivery::Dropped(DropReason::ConsumerError)
            }
        }
    }

    fn dropped(&self, reason: DropReason) -> Delivery {
        self.stats.record_dropped(reason);
        match reason {
            DropReason::NoConsumer => {
                tracing::trace!(renderer = %self.id, "no consumer bound; frame dropped")
            }
            _ => tracing::debug!(renderer = %self.id, ?reason, "frame dropped"),
        }
        Delivery::Dropped(reason)
    }
}
