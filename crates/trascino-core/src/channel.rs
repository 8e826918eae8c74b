//! The hook→worker command transport.
//!
//! A bounded channel with a strictly non-blocking producer. The hook
//! thread must never wait: a full queue means the worker is wedged
//! (modal menu, hung `SetWindowPos` target) and the command is dropped
//! and counted instead. Depth accounting rides alongside the channel so
//! the shutdown report can show the high-water mark.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, SyncSender, TryRecvError, TrySendError, sync_channel};

use crate::command::WindowCommand;

/// Monotonically non-decreasing transport counters.
#[derive(Debug, Default)]
pub struct ChannelStats {
    dropped: AtomicU64,
    peak_depth: AtomicU64,
}

impl ChannelStats {
    /// Commands dropped because the queue was full or the executor's
    /// rate limit rejected them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Most commands ever queued at once.
    pub fn peak_depth(&self) -> u64 {
        self.peak_depth.load(Ordering::Relaxed)
    }

    pub fn count_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn record_depth(&self, depth: u64) {
        self.peak_depth.fetch_max(depth, Ordering::Relaxed);
    }
}

/// Producer half, owned by the hook thread.
pub struct CommandSender {
    tx: SyncSender<WindowCommand>,
    depth: Arc<AtomicUsize>,
    stats: Arc<ChannelStats>,
}

impl CommandSender {
    /// Enqueues without blocking. Returns `false` (and counts a drop)
    /// when the queue is full or the consumer is gone.
    pub fn try_push(&self, cmd: WindowCommand) -> bool {
        match self.tx.try_send(cmd) {
            Ok(()) => {
                let depth = self.depth.fetch_add(1, Ordering::Relaxed) + 1;
                self.stats.record_depth(depth as u64);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                self.stats.count_drop();
                false
            }
        }
    }

    pub fn stats(&self) -> &Arc<ChannelStats> {
        &self.stats
    }
}

/// Consumer half, owned by the worker thread.
pub struct CommandReceiver {
    rx: Receiver<WindowCommand>,
    depth: Arc<AtomicUsize>,
    stats: Arc<ChannelStats>,
}

impl CommandReceiver {
    /// Dequeues without blocking; `None` when the queue is empty.
    pub fn try_pop(&self) -> Option<WindowCommand> {
        match self.rx.try_recv() {
            Ok(cmd) => {
                self.depth.fetch_sub(1, Ordering::Relaxed);
                Some(cmd)
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn stats(&self) -> &Arc<ChannelStats> {
        &self.stats
    }
}

/// Builds the bounded single-producer/single-consumer command queue.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = sync_channel(capacity);
    let depth = Arc::new(AtomicUsize::new(0));
    let stats = Arc::new(ChannelStats::default());
    (
        CommandSender {
            tx,
            depth: depth.clone(),
            stats: stats.clone(),
        },
        CommandReceiver { rx, depth, stats },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_preserves_order() {
        // Arrange
        let (tx, rx) = command_channel(8);

        // Act
        assert!(tx.try_push(WindowCommand::translate(1, 10, 10)));
        assert!(tx.try_push(WindowCommand::translate(1, 20, 20)));

        // Assert
        assert_eq!(rx.try_pop().unwrap().x, 10);
        assert_eq!(rx.try_pop().unwrap().x, 20);
        assert!(rx.try_pop().is_none());
    }

    #[test]
    fn full_queue_drops_without_blocking() {
        // Arrange
        let (tx, rx) = command_channel(2);
        assert!(tx.try_push(WindowCommand::translate(1, 0, 0)));
        assert!(tx.try_push(WindowCommand::translate(1, 1, 1)));

        // Act — each failed push counts exactly one drop.
        assert!(!tx.try_push(WindowCommand::translate(1, 2, 2)));
        assert!(!tx.try_push(WindowCommand::translate(1, 3, 3)));

        // Assert
        assert_eq!(tx.stats().dropped(), 2);
        assert_eq!(rx.try_pop().unwrap().x, 0);
        // Draining frees a slot again.
        assert!(tx.try_push(WindowCommand::translate(1, 4, 4)));
    }

    #[test]
    fn peak_depth_tracks_high_water_mark() {
        // Arrange
        let (tx, rx) = command_channel(8);

        // Act
        for i in 0..5 {
            tx.try_push(WindowCommand::translate(1, i, i));
        }
        while rx.try_pop().is_some() {}
        tx.try_push(WindowCommand::translate(1, 9, 9));

        // Assert — the mark does not shrink after a drain.
        assert_eq!(tx.stats().peak_depth(), 5);
    }

    #[test]
    fn disconnected_consumer_counts_drops() {
        // Arrange
        let (tx, rx) = command_channel(4);
        drop(rx);

        // Act
        let pushed = tx.try_push(WindowCommand::translate(1, 0, 0));

        // Assert
        assert!(!pushed);
        assert_eq!(tx.stats().dropped(), 1);
    }
}
