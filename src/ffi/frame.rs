use crate::engine::frame::FrameMetadata;

use super::XianFrameRenderer;
use super::status::{self, AbiError};

#[unsafe(no_mangle)]
/// ### English
/// Producer entry point: records the frame metadata and hands the frame bytes to the bound
/// consumer (or parks them for `xian_frame_relay_pump`).
///
/// - `data`/`data_length`: frame bytes; only borrowed for the duration of this call.
/// - `rotation`: clockwise degrees (`0/90/180/270`).
/// - `flip_mode`: `0..=3`.
///
/// Returns `XIAN_FRAME_RELAY_DELIVERED`, `XIAN_FRAME_RELAY_QUEUED`, one of the
/// `XIAN_FRAME_RELAY_DROPPED_*` codes, or a negative error. On a negative error the renderer's
/// metadata is left unchanged.
///
/// ### 中文
/// 生产者入口：记录帧元数据，并把帧字节交给已绑定的消费者（或暂存等待 `xian_frame_relay_pump`）。
///
/// - `data`/`data_length`：帧字节；仅在本次调用期间借用。
/// - `rotation`：顺时针角度（`0/90/180/270`）。
/// - `flip_mode`：`0..=3`。
///
/// 返回 `XIAN_FRAME_RELAY_DELIVERED`、`XIAN_FRAME_RELAY_QUEUED`、某个 `XIAN_FRAME_RELAY_DROPPED_*`，
/// 或负数错误码。返回负数时渲染器元数据保持不变。
pub unsafe extern "C" fn xian_frame_relay_renderer_deliver(
    renderer: *mut XianFrameRenderer,
    data: *const u8,
    data_length: usize,
    width: u32,
    height: u32,
    rotation: u32,
    flip_mode: u32,
) -> i32 {
    status::return_code(|| {
        let handle = unsafe { renderer.as_ref() }.ok_or(AbiError::NullHandle)?;
        let metadata = FrameMetadata::from_raw(width, height, rotation, flip_mode)?;
        let bytes = unsafe { status::parse_slice(data, data_length) }?;
        Ok(handle.renderer.deliver(bytes, metadata))
    })
}

#[cfg(test)]
mod tests {
    use std::ffi::c_void;
    use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

    use parking_lot::Mutex;

    use super::xian_frame_relay_renderer_deliver;
    use crate::engine::flags::XIAN_FRAME_RELAY_FLAG_QUEUED_DISPATCH;
    use crate::ffi::relay::{
        xian_frame_relay_create, xian_frame_relay_destroy, xian_frame_relay_pump,
    };
    use crate::ffi::renderer::{
        XianFrameRelayStats, xian_frame_relay_renderer_bind, xian_frame_relay_renderer_create,
        xian_frame_relay_renderer_destroy, xian_frame_relay_renderer_id,
        xian_frame_relay_renderer_metadata, xian_frame_relay_renderer_stats,
    };
    use crate::ffi::{
        XIAN_FRAME_RELAY_DELIVERED, XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR,
        XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER, XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT,
        XIAN_FRAME_RELAY_ERROR_NULL_HANDLE, XIAN_FRAME_RELAY_QUEUED, XianFrameRelayMetadata,
        XianFrameRelayRuntimeHooks, XianFrameRenderer,
    };

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<(u64, Vec<u8>, XianFrameRelayMetadata)>>,
        status: AtomicI32,
    }

    extern "C" fn record(
        user_data: *mut c_void,
        renderer_id: u64,
        data: *const u8,
        data_length: usize,
        metadata: *const XianFrameRelayMetadata,
    ) -> i32 {
        let recorder = unsafe { &*(user_data as *const Recorder) };
        let bytes = unsafe { std::slice::from_raw_parts(data, data_length) }.to_vec();
        let metadata = unsafe { *metadata };
        recorder.frames.lock().push((renderer_id, bytes, metadata));
        recorder.status.load(Ordering::SeqCst)
    }

    fn user_data(recorder: &Recorder) -> *mut c_void {
        recorder as *const Recorder as *mut c_void
    }

    fn read_metadata(renderer: *const XianFrameRenderer) -> XianFrameRelayMetadata {
        let mut out = XianFrameRelayMetadata::default();
        assert!(unsafe { xian_frame_relay_renderer_metadata(renderer, &mut out) });
        out
    }

    #[test]
    fn direct_flow_delivers_and_reports_outcomes() {
        let recorder = Recorder::default();
        unsafe {
            let relay = xian_frame_relay_create(0, std::ptr::null());
            assert!(!relay.is_null());
            let renderer = xian_frame_relay_renderer_create(relay);
            assert!(!renderer.is_null());
            let id = xian_frame_relay_renderer_id(renderer);
            assert_ne!(id, 0);

            let frame = [1u8, 2, 3, 4];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 2, 2, 0, 0),
                XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER
            );

            assert_eq!(
                xian_frame_relay_renderer_bind(renderer, Some(record), user_data(&recorder)),
                0
            );
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 1920, 1080, 90, 1),
                XIAN_FRAME_RELAY_DELIVERED
            );

            let expected = XianFrameRelayMetadata {
                width: 1920,
                height: 1080,
                rotation: 90,
                flip_mode: 1,
            };
            {
                let frames = recorder.frames.lock();
                assert_eq!(frames.len(), 1);
                assert_eq!(frames[0], (id, frame.to_vec(), expected));
            }
            assert_eq!(read_metadata(renderer), expected);

            recorder.status.store(7, Ordering::SeqCst);
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 8, 8, 0, 0),
                XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR
            );
            recorder.status.store(0, Ordering::SeqCst);
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 8, 8, 0, 0),
                XIAN_FRAME_RELAY_DELIVERED
            );

            assert_eq!(xian_frame_relay_renderer_bind(renderer, None, std::ptr::null_mut()), 0);
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 16, 9, 180, 2),
                XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER
            );
            assert_eq!(read_metadata(renderer).width, 16);

            let mut stats = XianFrameRelayStats::default();
            assert!(xian_frame_relay_renderer_stats(renderer, &mut stats));
            assert_eq!(stats.delivered, 2);
            assert_eq!(stats.no_consumer, 2);
            assert_eq!(stats.consumer_error, 1);

            xian_frame_relay_renderer_destroy(renderer);
            xian_frame_relay_destroy(relay);
        }
        assert_eq!(recorder.frames.lock().len(), 3);
    }

    #[test]
    fn invalid_arguments_leave_metadata_untouched() {
        unsafe {
            let relay = xian_frame_relay_create(0, std::ptr::null());
            let renderer = xian_frame_relay_renderer_create(relay);

            let frame = [0u8; 4];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 640, 480, 0, 0),
                XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER
            );
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, std::ptr::null(), 4, 1, 1, 0, 0),
                XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT
            );
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 1, 1, 45, 0),
                XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT
            );
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 4, 1, 1, 0, 9),
                XIAN_FRAME_RELAY_ERROR_INVALID_ARGUMENT
            );
            let metadata = read_metadata(renderer);
            assert_eq!((metadata.width, metadata.height), (640, 480));

            // Empty frames are legal when the pointer is NULL.
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, std::ptr::null(), 0, 2, 2, 0, 0),
                XIAN_FRAME_RELAY_DROPPED_NO_CONSUMER
            );

            xian_frame_relay_renderer_destroy(renderer);
            xian_frame_relay_destroy(relay);
        }
    }

    #[test]
    fn null_handles_are_rejected() {
        unsafe {
            let frame = [0u8; 1];
            assert_eq!(
                xian_frame_relay_renderer_deliver(std::ptr::null_mut(), frame.as_ptr(), 1, 1, 1, 0, 0),
                XIAN_FRAME_RELAY_ERROR_NULL_HANDLE
            );
            assert_eq!(
                xian_frame_relay_renderer_bind(std::ptr::null_mut(), None, std::ptr::null_mut()),
                XIAN_FRAME_RELAY_ERROR_NULL_HANDLE
            );
            assert_eq!(xian_frame_relay_pump(std::ptr::null_mut()), XIAN_FRAME_RELAY_ERROR_NULL_HANDLE);
            assert!(xian_frame_relay_renderer_create(std::ptr::null_mut()).is_null());
            assert_eq!(xian_frame_relay_renderer_id(std::ptr::null()), 0);
            let mut out = XianFrameRelayMetadata::default();
            assert!(!xian_frame_relay_renderer_metadata(std::ptr::null(), &mut out));
            xian_frame_relay_renderer_destroy(std::ptr::null_mut());
            xian_frame_relay_destroy(std::ptr::null_mut());
        }
    }

    static ENTERED: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_enter(_user_data: *mut c_void) {
        ENTERED.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn single_threaded_runtime_queues_until_pumped() {
        let recorder = Recorder::default();
        let hooks = XianFrameRelayRuntimeHooks {
            user_data: std::ptr::null_mut(),
            supports_foreign_threads: 0,
            enter: Some(count_enter),
            leave: None,
            clear_error: None,
            take_error: None,
        };
        unsafe {
            let relay = xian_frame_relay_create(0, &hooks);
            let renderer = xian_frame_relay_renderer_create(relay);
            let id = xian_frame_relay_renderer_id(renderer);
            xian_frame_relay_renderer_bind(renderer, Some(record), user_data(&recorder));

            let first = [1u8; 2];
            let second = [2u8; 2];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, first.as_ptr(), 2, 1, 1, 0, 0),
                XIAN_FRAME_RELAY_QUEUED
            );
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, second.as_ptr(), 2, 1, 1, 0, 0),
                XIAN_FRAME_RELAY_QUEUED
            );
            assert!(recorder.frames.lock().is_empty());
            assert_eq!(ENTERED.load(Ordering::SeqCst), 0);

            assert_eq!(xian_frame_relay_pump(relay), 1);
            assert_eq!(xian_frame_relay_pump(relay), 0);
            assert_eq!(ENTERED.load(Ordering::SeqCst), 1);

            xian_frame_relay_renderer_destroy(renderer);
            xian_frame_relay_destroy(relay);

            let frames = recorder.frames.lock();
            assert_eq!(frames.len(), 1);
            assert_eq!(frames[0].0, id);
            assert_eq!(frames[0].1, second.to_vec());
        }
    }

    #[test]
    fn queued_flag_forces_queueing_on_a_reentrant_runtime() {
        let recorder = Recorder::default();
        unsafe {
            let relay = xian_frame_relay_create(XIAN_FRAME_RELAY_FLAG_QUEUED_DISPATCH, std::ptr::null());
            let renderer = xian_frame_relay_renderer_create(relay);
            xian_frame_relay_renderer_bind(renderer, Some(record), user_data(&recorder));

            let frame = [5u8; 3];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, frame.as_ptr(), 3, 3, 1, 270, 3),
                XIAN_FRAME_RELAY_QUEUED
            );
            assert_eq!(xian_frame_relay_pump(relay), 1);

            xian_frame_relay_renderer_destroy(renderer);
            xian_frame_relay_destroy(relay);
        }
        let frames = recorder.frames.lock();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].2.rotation, 270);
        assert_eq!(frames[0].2.flip_mode, 3);
    }

    /// Script-engine double driven through C hooks: records hook order and holds one
    /// pending-error status.
    #[derive(Default)]
    struct HookLog {
        events: Mutex<Vec<&'static str>>,
        depth: AtomicI32,
        pending: AtomicI32,
    }

    fn hook_log(user_data: *mut c_void) -> &'static HookLog {
        unsafe { &*(user_data as *const HookLog) }
    }

    extern "C" fn hook_enter(user_data: *mut c_void) {
        let log = hook_log(user_data);
        log.depth.fetch_add(1, Ordering::SeqCst);
        log.events.lock().push("enter");
    }

    extern "C" fn hook_leave(user_data: *mut c_void) {
        let log = hook_log(user_data);
        log.depth.fetch_sub(1, Ordering::SeqCst);
        log.events.lock().push("leave");
    }

    extern "C" fn hook_clear_error(user_data: *mut c_void) {
        let log = hook_log(user_data);
        log.pending.store(0, Ordering::SeqCst);
        log.events.lock().push("clear");
    }

    extern "C" fn hook_take_error(user_data: *mut c_void) -> i32 {
        let log = hook_log(user_data);
        log.events.lock().push("take");
        log.pending.swap(0, Ordering::SeqCst)
    }

    /// Frame callback that raises through the engine when the frame's first byte is non-zero.
    extern "C" fn script_handler(
        user_data: *mut c_void,
        _renderer_id: u64,
        data: *const u8,
        data_length: usize,
        _metadata: *const XianFrameRelayMetadata,
    ) -> i32 {
        let log = hook_log(user_data);
        let in_scope = log.depth.load(Ordering::SeqCst) == 1;
        log.events.lock().push(if in_scope { "call" } else { "call-unscoped" });
        let bytes = unsafe { std::slice::from_raw_parts(data, data_length) };
        if bytes.first().copied().unwrap_or(0) != 0 {
            log.pending.store(13, Ordering::SeqCst);
        }
        0
    }

    #[test]
    fn direct_dispatch_runs_every_runtime_hook_around_the_callback() {
        let log = HookLog::default();
        let log_ptr = &log as *const HookLog as *mut c_void;
        let hooks = XianFrameRelayRuntimeHooks {
            user_data: log_ptr,
            supports_foreign_threads: 1,
            enter: Some(hook_enter),
            leave: Some(hook_leave),
            clear_error: Some(hook_clear_error),
            take_error: Some(hook_take_error),
        };
        unsafe {
            let relay = xian_frame_relay_create(0, &hooks);
            let renderer = xian_frame_relay_renderer_create(relay);
            xian_frame_relay_renderer_bind(renderer, Some(script_handler), log_ptr);

            // Stale error from an earlier call must be cleared before the callback.
            log.pending.store(99, Ordering::SeqCst);
            let raising = [1u8; 4];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, raising.as_ptr(), 4, 2, 2, 0, 0),
                XIAN_FRAME_RELAY_DROPPED_CONSUMER_ERROR
            );
            assert_eq!(
                *log.events.lock(),
                vec!["enter", "clear", "call", "take", "leave"]
            );

            log.events.lock().clear();
            log.pending.store(99, Ordering::SeqCst);
            let clean = [0u8; 4];
            assert_eq!(
                xian_frame_relay_renderer_deliver(renderer, clean.as_ptr(), 4, 2, 2, 0, 0),
                XIAN_FRAME_RELAY_DELIVERED
            );
            assert_eq!(
                *log.events.lock(),
                vec!["enter", "clear", "call", "take", "leave"]
            );
            assert_eq!(log.depth.load(Ordering::SeqCst), 0);

            xian_frame_relay_renderer_destroy(renderer);
            xian_frame_relay_destroy(relay);
        }
    }
}
