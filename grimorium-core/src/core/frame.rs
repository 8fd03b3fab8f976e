//! Coalesces high-frequency input into at most one update per frame.

/// Holds the most recent value requested since the last frame tick.
///
/// Pointer moves call [`request`](Self::request) as often as they arrive;
/// the host's frame callback calls [`take_for_frame`](Self::take_for_frame)
/// once per tick. Values overwritten before a tick are counted as coalesced
/// and never processed, but the last one before the tick always is.
#[derive(Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    requested: u64,
    coalesced: u64,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self {
            pending: None,
            requested: 0,
            coalesced: 0,
        }
    }
}

impl<T> FrameCoalescer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `value` for the next frame, replacing any queued value.
    pub fn request(&mut self, value: T) {
        self.requested += 1;
        if self.pending.replace(value).is_some() {
            self.coalesced += 1;
        }
    }

    /// Returns the queued value for this frame, if any.
    pub fn take_for_frame(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Returns the queued value without waiting for a frame (used on release).
    pub fn flush(&mut self) -> Option<T> {
        self.pending.take()
    }

    /// Discards anything queued.
    pub fn clear(&mut self) {
        self.pending = None;
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Total number of requests seen.
    #[must_use]
    pub fn requested(&self) -> u64 {
        self.requested
    }

    /// Requests that were replaced before a frame picked them up.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_value_reaches_the_frame() {
        let mut frames = FrameCoalescer::new();
        frames.request(1);
        frames.request(2);
        frames.request(3);
        assert_eq!(frames.take_for_frame(), Some(3));
        assert_eq!(frames.take_for_frame(), None);
        assert_eq!(frames.requested(), 3);
        assert_eq!(frames.coalesced(), 2);
    }

    #[test]
    fn test_clear_drops_pending() {
        let mut frames = FrameCoalescer::new();
        frames.request("a");
        frames.clear();
        assert!(!frames.has_pending());
        assert_eq!(frames.flush(), None);
    }
}
