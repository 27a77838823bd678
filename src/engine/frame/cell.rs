//! ### English
//! Sequence-locked metadata cell: readers never block writers and never observe a torn value.
//!
//! ### 中文
//! 基于序列锁的元数据单元：读者不阻塞写者，且永远不会读到撕裂的值。

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering, fence};
use std::thread;

use super::{FlipMode, FrameMetadata, Rotation};

/// ### English
/// Spin budget before a retrying reader/writer starts yielding.
///
/// ### 中文
/// 重试中的读者/写者开始让出调度前的自旋预算。
const SPIN_LIMIT: u32 = 32;

struct Retry {
    spins: u32,
}

impl Retry {
    #[inline]
    fn new() -> Self {
        Self { spins: 0 }
    }

    #[inline]
    fn wait(&mut self) {
        if self.spins < SPIN_LIMIT {
            self.spins += 1;
            std::hint::spin_loop();
        } else {
            thread::yield_now();
        }
    }
}

/// ### English
/// Latest-frame metadata shared between the producer thread and any reader thread.
///
/// - `seq` is even when stable and odd while a writer is publishing.
/// - Readers retry until they observe the same even `seq` before and after reading both words.
///
/// ### 中文
/// 在生产者线程与任意读者线程之间共享的最新帧元数据。
///
/// - `seq` 为偶数表示稳定，为奇数表示写者正在发布。
/// - 读者在读取两个字之前与之后观察到同一个偶数 `seq` 才算成功，否则重试。
pub(crate) struct MetadataCell {
    seq: AtomicU64,
    /// `width | height << 32`
    size: AtomicU64,
    /// `rotation | flip << 8`
    orientation: AtomicU32,
}

impl Default for MetadataCell {
    fn default() -> Self {
        let cell = Self {
            seq: AtomicU64::new(0),
            size: AtomicU64::new(0),
            orientation: AtomicU32::new(0),
        };
        cell.store(FrameMetadata::default());
        cell
    }
}

impl MetadataCell {
    /// ### English
    /// Publishes a whole metadata value. Concurrent writers are serialized by the odd `seq`.
    ///
    /// ### 中文
    /// 发布一个完整的元数据值。并发写者通过奇数 `seq` 串行化。
    pub(crate) fn store(&self, metadata: FrameMetadata) {
        let mut retry = Retry::new();
        let start = loop {
            let seq = self.seq.load(Ordering::Relaxed);
            if seq & 1 == 0
                && self
                    .seq
                    .compare_exchange_weak(seq, seq | 1, Ordering::Acquire, Ordering::Relaxed)
                    .is_ok()
            {
                break seq;
            }
            retry.wait();
        };
        fence(Ordering::Release);

        let (size, orientation) = pack(metadata);
        self.size.store(size, Ordering::Relaxed);
        self.orientation.store(orientation, Ordering::Relaxed);

        self.seq.store(start.wrapping_add(2), Ordering::Release);
    }

    /// ### English
    /// Returns the most recently published metadata.
    ///
    /// ### 中文
    /// 返回最近一次发布的元数据。
    pub(crate) fn load(&self) -> FrameMetadata {
        let mut retry = Retry::new();
        loop {
            let before = self.seq.load(Ordering::Acquire);
            if before & 1 == 0 {
                let size = self.size.load(Ordering::Relaxed);
                let orientation = self.orientation.load(Ordering::Relaxed);
                fence(Ordering::Acquire);
                if self.seq.load(Ordering::Relaxed) == before {
                    return unpack(size, orientation);
                }
            }
            retry.wait();
        }
    }
}

#[inline]
fn pack(metadata: FrameMetadata) -> (u64, u32) {
    let size = (metadata.size.width as u64) | ((metadata.size.height as u64) << 32);
    let orientation = (metadata.rotation.code() as u32) | ((metadata.flip as u32) << 8);
    (size, orientation)
}

#[inline]
fn unpack(size: u64, orientation: u32) -> FrameMetadata {
    FrameMetadata::new(
        (size & 0xFFFF_FFFF) as u32,
        (size >> 32) as u32,
        Rotation::from_code(orientation as u8),
        FlipMode::from_code((orientation >> 8) as u8),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;

    use super::*;

    #[test]
    fn starts_unset_and_returns_last_store() {
        let cell = MetadataCell::default();
        assert_eq!(cell.load(), FrameMetadata::default());

        let meta = FrameMetadata::new(u32::MAX, 7, Rotation::Deg270, FlipMode::Vertical);
        cell.store(meta);
        assert_eq!(cell.load(), meta);
    }

    #[test]
    fn readers_never_see_a_mix_of_two_writes() {
        let a = FrameMetadata::new(1920, 1080, Rotation::Deg0, FlipMode::None);
        let b = FrameMetadata::new(720, 1280, Rotation::Deg90, FlipMode::Both);

        let cell = Arc::new(MetadataCell::default());
        cell.store(a);
        let stop = Arc::new(AtomicBool::new(false));

        let writers: Vec<_> = [a, b]
            .into_iter()
            .map(|meta| {
                let cell = cell.clone();
                let stop = stop.clone();
                thread::spawn(move || {
                    while !stop.load(Ordering::Relaxed) {
                        cell.store(meta);
                    }
                })
            })
            .collect();

        for _ in 0..100_000 {
            let seen = cell.load();
            assert!(seen == a || seen == b, "torn metadata: {seen:?}");
        }

        stop.store(true, Ordering::Relaxed);
        for writer in writers {
            writer.join().unwrap();
        }
    }
}
