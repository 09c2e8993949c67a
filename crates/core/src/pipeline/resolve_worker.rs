use std::io;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::Receiver;

use crate::media::domain::media_resolver::{MediaRef, MediaResolver, ResolverError};
use crate::shared::emotion::Mood;

pub enum ResolveMessage {
    Resolved { mood: Mood, media: Vec<MediaRef> },
    Failed { mood: Mood, error: ResolverError },
}

/// Resolve `mood` on a worker thread. The single result arrives on the
/// returned channel; dropping the receiver abandons it. A thread that
/// cannot be started is reported on the same channel.
pub fn spawn(resolver: Arc<dyn MediaResolver>, mood: Mood) -> Receiver<ResolveMessage> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    let worker_tx = tx.clone();

    let spawned = thread::Builder::new()
        .name("resolve".into())
        .spawn(move || {
            let message = match resolver.resolve(mood) {
                Ok(media) if media.is_empty() => ResolveMessage::Failed {
                    mood,
                    error: ResolverError::NoMatch(mood.emotion.to_string()),
                },
                Ok(media) => ResolveMessage::Resolved { mood, media },
                Err(error) => ResolveMessage::Failed { mood, error },
            };
            let _ = worker_tx.send(message);
        });

    if let Err(e) = spawned {
        log::error!("Failed to spawn resolve thread: {e}");
        let _ = tx.send(not_started(mood, &e));
    }
    rx
}

fn not_started(mood: Mood, error: &io::Error) -> ResolveMessage {
    ResolveMessage::Failed {
        mood,
        error: ResolverError::Worker(error.to_string()),
    }
}
