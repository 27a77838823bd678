//! ### English
//! Frame relay: owns identity allocation, the consumer runtime, and the renderer registry,
//! and runs the consumer-turn drain for queued dispatch.
//!
//! ### 中文
//! 帧中继：持有标识分配器、消费者运行时与渲染器注册表，并为排队分发执行消费者调度轮次的 drain。

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::engine::config::{DispatchMode, RelayConfig};
use crate::engine::consumer::ConsumerRuntime;
use crate::engine::pending::PendingRendererQueue;
use crate::engine::renderer::{Delivery, TextureRenderer};
use crate::engine::sequence::{RendererId, SequenceAllocator};

/// ### English
/// What one `pump` handed to the consumer.
///
/// ### 中文
/// 单次 `pump` 交给消费者的结果统计。
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub delivered: usize,
    pub dropped: usize,
}

impl PumpReport {
    #[inline]
    pub fn total(&self) -> usize {
        self.delivered + self.dropped
    }

    fn record(&mut self, outcome: Delivery) {
        match outcome {
            Delivery::Delivered => self.delivered += 1,
            Delivery::Dropped(_) => self.dropped += 1,
            Delivery::Queued { .. } => {}
        }
    }
}

struct RelayShared {
    sequence: SequenceAllocator,
    runtime: Arc<dyn ConsumerRuntime>,
    dispatch: DispatchMode,
    renderers: RwLock<HashMap<RendererId, Arc<TextureRenderer>>>,
    pending: Arc<PendingRendererQueue>,
}

/// ### English
/// Process-scoped relay handle (cheap to clone; clones share state).
///
/// ### 中文
/// 进程级中继句柄（克隆开销低；克隆体共享状态）。
#[derive(Clone)]
pub struct FrameRelay {
    shared: Arc<RelayShared>,
}

impl FrameRelay {
    /// ### English
    /// Creates a relay for `runtime`. The dispatch mode is resolved once, here.
    ///
    /// ### 中文
    /// 为 `runtime` 创建中继。分发方式只在此处解析一次。
    pub fn new(runtime: Arc<dyn ConsumerRuntime>, config: RelayConfig) -> Self {
        let dispatch = config.dispatch.resolve(runtime.as_ref());
        tracing::info!(?dispatch, pending_capacity = config.pending_capacity, "frame relay created");
        Self {
            shared: Arc::new(RelayShared {
                sequence: SequenceAllocator::new(),
                runtime,
                dispatch,
                renderers: RwLock::new(HashMap::new()),
                pending: Arc::new(PendingRendererQueue::with_capacity(config.pending_capacity)),
            }),
        }
    }

    #[inline]
    pub fn dispatch_mode(&self) -> DispatchMode {
        self.shared.dispatch
    }

    /// ### English
    /// Creates and registers a renderer with a fresh identity.
    ///
    /// ### 中文
    /// 创建并注册一个带新标识的渲染器。
    pub fn create_renderer(&self) -> Arc<TextureRenderer> {
        let shared = &self.shared;
        let id = shared.sequence.next();
        let renderer = Arc::new(TextureRenderer::with_dispatch(
            id,
            shared.runtime.clone(),
            shared.dispatch,
            Some(shared.pending.clone()),
        ));
        shared.renderers.write().insert(id, renderer.clone());
        tracing::debug!(renderer = %id, "renderer created");
        renderer
    }

    pub fn renderer(&self, id: RendererId) -> Option<Arc<TextureRenderer>> {
        self.shared.renderers.read().get(&id).cloned()
    }

    /// ### English
    /// Unregisters a renderer. Handles still held elsewhere stay usable, but `pump` no longer
    /// drains it. Returns `false` if `id` was not registered.
    ///
    /// ### 中文
    /// 注销一个渲染器。其它地方仍持有的句柄依然可用，但 `pump` 不再 drain 它。
    /// 若 `id` 未注册则返回 `false`。
    pub fn destroy_renderer(&self, id: RendererId) -> bool {
        let removed = self.shared.renderers.write().remove(&id);
        if removed.is_some() {
            tracing::debug!(renderer = %id, "renderer destroyed");
        }
        removed.is_some()
    }

    pub fn renderer_count(&self) -> usize {
        self.shared.renderers.read().len()
    }

    /// ### English
    /// Consumer turn: delivers every parked frame (queued dispatch). Call from the consumer
    /// runtime's own thread, e.g. once per engine tick. No-op for direct dispatch.
    ///
    /// Only IDs queued before this call are drained, so a fast producer cannot keep one pump
    /// running. After a pending-queue overflow, every registered renderer is scanned once.
    ///
    /// ### 中文
    /// 消费者调度轮次：投递所有暂存帧（排队分发）。应在消费者运行时自己的线程调用，例如每个引擎 tick
    /// 一次。直接分发时为空操作。
    ///
    /// 只处理本次调用前已入队的 ID，避免高速生产者让单次 pump 无法结束。
    /// 待处理队列溢出后，会对所有已注册渲染器扫描一次。
    pub fn pump(&self) -> PumpReport {
        let mut report = PumpReport::default();
        if self.shared.dispatch != DispatchMode::Queued {
            return report;
        }

        let pending = &self.shared.pending;
        for _ in 0..pending.len() {
            let Some(id) = pending.pop() else {
                break;
            };
            if let Some(outcome) = self.renderer(id).and_then(|renderer| renderer.drain()) {
                report.record(outcome);
            }
        }

        if pending.take_overflowed() {
            tracing::debug!("pending queue overflowed; scanning all renderers");
            let renderers: Vec<_> = self.shared.renderers.read().values().cloned().collect();
            for renderer in renderers {
                if let Some(outcome) = renderer.drain() {
                    report.record(outcome);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;

    use super::*;
    use crate::engine::binding::ConsumerBinding;
    use crate::engine::consumer::ReentrantRuntime;
    use crate::engine::error::DropReason;
    use crate::engine::frame::{FlipMode, FrameMetadata, Rotation};

    /// Single-threaded engine loop double.
    struct EngineLoop;
    impl ConsumerRuntime for EngineLoop {
        fn supports_foreign_threads(&self) -> bool {
            false
        }
    }

    fn meta(width: u32) -> FrameMetadata {
        FrameMetadata::new(width, 1, Rotation::Deg0, FlipMode::None)
    }

    fn seen_log() -> (Arc<Mutex<Vec<(RendererId, u8)>>>, ConsumerBinding) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let binding = ConsumerBinding::from_fn(move |id, frame| {
            log.lock().push((id, frame.as_bytes()[0]));
            Ok(())
        });
        (seen, binding)
    }

    #[test]
    fn renderers_get_distinct_increasing_identities() {
        let relay = FrameRelay::new(Arc::new(ReentrantRuntime), RelayConfig::default());
        let ids: Vec<_> = (0..16).map(|_| relay.create_renderer().identity()).collect();
        assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(relay.renderer_count(), 16);
    }

    #[test]
    fn lookup_and_destroy_by_identity() {
        let relay = FrameRelay::new(Arc::new(ReentrantRuntime), RelayConfig::default());
        let renderer = relay.create_renderer();
        let id = renderer.identity();

        assert!(Arc::ptr_eq(&relay.renderer(id).unwrap(), &renderer));
        assert!(relay.destroy_renderer(id));
        assert!(!relay.destroy_renderer(id));
        assert!(relay.renderer(id).is_none());
    }

    #[test]
    fn single_threaded_runtime_gets_frames_on_pump() {
        let relay = FrameRelay::new(Arc::new(EngineLoop), RelayConfig::default());
        assert_eq!(relay.dispatch_mode(), DispatchMode::Queued);

        let first = relay.create_renderer();
        let second = relay.create_renderer();
        let (seen, binding) = seen_log();
        first.bind(Some(binding));
        let (seen_second, binding) = seen_log();
        second.bind(Some(binding));

        first.deliver(&[1], meta(1));
        first.deliver(&[2], meta(1));
        first.deliver(&[3], meta(1));
        second.deliver(&[9], meta(1));
        assert!(seen.lock().is_empty());

        let report = relay.pump();
        assert_eq!(report, PumpReport { delivered: 2, dropped: 0 });
        assert_eq!(*seen.lock(), vec![(first.identity(), 3)]);
        assert_eq!(*seen_second.lock(), vec![(second.identity(), 9)]);
        assert_eq!(first.stats().superseded, 2);

        assert_eq!(relay.pump().total(), 0);
    }

    #[test]
    fn overflow_falls_back_to_scanning_every_renderer() {
        let relay = FrameRelay::new(
            Arc::new(ReentrantRuntime),
            RelayConfig {
                dispatch: DispatchMode::Queued,
                pending_capacity: 1,
            },
        );

        let seen = Arc::new(Mutex::new(Vec::new()));
        let renderers: Vec<_> = (0..4).map(|_| relay.create_renderer()).collect();
        for (index, renderer) in renderers.iter().enumerate() {
            let log = seen.clone();
            renderer.bind(Some(ConsumerBinding::from_fn(move |id, frame| {
                log.lock().push((id, frame.as_bytes()[0]));
                Ok(())
            })));
            renderer.deliver(&[index as u8], meta(1));
        }

        assert_eq!(relay.pump().delivered, 4);
        let mut frames: Vec<u8> = seen.lock().iter().map(|&(_, index)| index).collect();
        frames.sort();
        assert_eq!(frames, vec![0, 1, 2, 3]);
        assert!(renderers.iter().all(|renderer| renderer.drain().is_none()));
    }

    #[test]
    fn parked_frame_for_unbound_renderer_counts_as_dropped() {
        let relay = FrameRelay::new(Arc::new(EngineLoop), RelayConfig::default());
        let renderer = relay.create_renderer();
        renderer.bind(Some(seen_log().1));
        renderer.deliver(&[1], meta(1));
        renderer.unbind();

        let report = relay.pump();
        assert_eq!(report, PumpReport { delivered: 0, dropped: 1 });
        assert_eq!(renderer.stats().no_consumer, 1);
        assert_eq!(
            renderer.deliver(&[2], meta(1)),
            Delivery::Dropped(DropReason::NoConsumer)
        );
    }

    #[test]
    fn pump_is_a_no_op_for_direct_dispatch() {
        let relay = FrameRelay::new(Arc::new(ReentrantRuntime), RelayConfig::default());
        let renderer = relay.create_renderer();
        renderer.bind(Some(seen_log().1));
        assert!(renderer.deliver(&[1], meta(1)).is_delivered());
        assert_eq!(relay.pump(), PumpReport::default());
    }
}
