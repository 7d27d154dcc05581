use crate::commands::music::audio_sources::TrackMetadata;
use std::collections::VecDeque;
use std::time::Duration;

/// One line of the queue listing, 1-indexed for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub position: usize,
    pub title: String,
    pub duration: Option<Duration>,
}

/// Pending tracks for a session, in playback order.
///
/// Never holds the track that is currently streaming.
#[derive(Debug, Default)]
pub struct PlaybackQueue {
    tracks: VecDeque<TrackMetadata>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track to the tail of the queue
    pub fn push(&mut self, track: TrackMetadata) {
        self.tracks.push_back(track);
    }

    /// Take the next track to play
    pub fn pop(&mut self) -> Option<TrackMetadata> {
        self.tracks.pop_front()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Snapshot of the queue for display
    pub fn entries(&self) -> Vec<QueueEntry> {
        self.tracks
            .iter()
            .enumerate()
            .map(|(index, track)| QueueEntry {
                position: index + 1,
                title: track.title.clone(),
                duration: track.duration,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(title: &str, secs: Option<u64>) -> TrackMetadata {
        TrackMetadata {
            title: title.to_string(),
            playable_url: format!("https://media.example/{}", title),
            external_id: None,
            page_url: None,
            duration: secs.map(Duration::from_secs),
        }
    }

    #[test]
    fn test_pop_follows_insertion_order() {
        let mut queue = PlaybackQueue::new();
        queue.push(track("a", None));
        queue.push(track("b", None));
        queue.push(track("a", None));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop())
            .map(|track| track.title)
            .collect();

        assert_eq!(order, vec!["a", "b", "a"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_entries_are_one_indexed() {
        let mut queue = PlaybackQueue::new();
        queue.push(track("first", Some(60)));
        queue.push(track("second", None));

        assert_eq!(
            queue.entries(),
            vec![
                QueueEntry {
                    position: 1,
                    title: "first".to_string(),
                    duration: Some(Duration::from_secs(60)),
                },
                QueueEntry {
                    position: 2,
                    title: "second".to_string(),
                    duration: None,
                },
            ]
        );
    }

    #[test]
    fn test_clear_empties_queue() {
        let mut queue = PlaybackQueue::new();
        queue.push(track("a", None));
        queue.clear();

        assert_eq!(queue.len(), 0);
        assert!(queue.entries().is_empty());
        assert_eq!(queue.pop(), None);
    }
}
