//! Upload progress reporting.
//!
//! Progress is synthesized: the transport sends the body in one request, so
//! the controller advances a fixed step per tick while the request is in
//! flight and only reports 100 once the server confirmed the upload.

use tokio::sync::watch;

pub const PROGRESS_STEP: u8 = 10;
pub const PROGRESS_IN_FLIGHT_CAP: u8 = 90;
pub const PROGRESS_DONE: u8 = 100;

#[derive(Debug)]
pub struct UploadProgress {
    tx: watch::Sender<u8>,
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadProgress {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }

    pub fn value(&self) -> u8 {
        *self.tx.borrow()
    }

    /// Start of a new attempt.
    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    /// One tick while in flight. Never passes the in-flight cap.
    pub fn advance(&self) {
        self.tx.send_if_modified(|value| {
            if *value >= PROGRESS_IN_FLIGHT_CAP {
                return false;
            }
            *value = (*value + PROGRESS_STEP).min(PROGRESS_IN_FLIGHT_CAP);
            true
        });
    }

    pub fn complete(&self) {
        self.tx.send_replace(PROGRESS_DONE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_caps_below_done() {
        let progress = UploadProgress::new();
        for _ in 0..20 {
            progress.advance();
        }
        assert_eq!(progress.value(), PROGRESS_IN_FLIGHT_CAP);

        progress.complete();
        assert_eq!(progress.value(), PROGRESS_DONE);
    }

    #[test]
    fn advance_after_complete_is_ignored() {
        let progress = UploadProgress::new();
        progress.complete();
        progress.advance();
        assert_eq!(progress.value(), PROGRESS_DONE);
    }

    #[test]
    fn observed_values_never_decrease() {
        let progress = UploadProgress::new();
        let rx = progress.subscribe();
        let mut last = 0;
        for _ in 0..12 {
            progress.advance();
            let current = *rx.borrow();
            assert!(current >= last);
            last = current;
        }
        progress.complete();
        assert!(*rx.borrow() >= last);
    }
}
