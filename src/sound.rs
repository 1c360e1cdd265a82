//! Queue between the engine and whatever actually produces audio.

use crate::control::SoundSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::mpsc;
use tracing::warn;

/// One queued audio request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SoundItem {
    Speak(String),
    Play(String),
}

/// Sending half, handed to the engine as its [`SoundSink`].
#[derive(Debug, Clone)]
pub struct SoundQueue {
    tx: mpsc::UnboundedSender<SoundItem>,
    pending: Arc<AtomicUsize>,
}

/// Receiving half, owned by the audio player.
#[derive(Debug)]
pub struct SoundReceiver {
    rx: mpsc::UnboundedReceiver<SoundItem>,
    pending: Arc<AtomicUsize>,
}

impl SoundQueue {
    pub fn new() -> (Self, SoundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        let pending = Arc::new(AtomicUsize::new(0));
        (
            Self {
                tx,
                pending: Arc::clone(&pending),
            },
            SoundReceiver { rx, pending },
        )
    }

    fn push(&self, item: SoundItem) {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(item).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!("Sound player is gone; dropping audio request");
        }
    }
}

impl SoundSink for SoundQueue {
    fn speak(&self, text: &str) {
        self.push(SoundItem::Speak(text.to_string()));
    }

    fn play(&self, sound: &str) {
        self.push(SoundItem::Play(sound.to_string()));
    }

    fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

impl SoundReceiver {
    /// Next item to play. Call [`done`](Self::done) once it has finished.
    pub async fn recv(&mut self) -> Option<SoundItem> {
        self.rx.recv().await
    }

    /// Mark one received item as played.
    pub fn done(&self) {
        let _ = self
            .pending
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_tracks_queue() {
        let (queue, mut rx) = SoundQueue::new();
        queue.speak("hello");
        queue.play("chime");
        assert_eq!(queue.pending(), 2);

        assert_eq!(rx.recv().await, Some(SoundItem::Speak("hello".to_string())));
        rx.done();
        assert_eq!(queue.pending(), 1);

        assert_eq!(rx.recv().await, Some(SoundItem::Play("chime".to_string())));
        rx.done();
        rx.done();
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn test_closed_receiver_drops_requests() {
        let (queue, rx) = SoundQueue::new();
        drop(rx);
        queue.speak("nobody listens");
        assert_eq!(queue.pending(), 0);
    }
}
