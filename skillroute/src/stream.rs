//! Incremental response output for a chat turn.

use skillroute_api::ButtonSpec;
use std::sync::Mutex;

/// Piece of output written to a [`ResponseStream`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPart {
    Progress(String),
    Markdown(String),
    Button(ButtonSpec),
}

/// Write-only sink for incremental responses.
///
/// Implementations forward to the IDE chat surface and must not block.
pub trait ResponseStream: Send + Sync {
    /// Transient progress message ("Processing...")
    fn progress(&self, message: &str);

    /// Rendered response text
    fn markdown(&self, text: &str);

    /// Clickable command button
    fn button(&self, button: ButtonSpec);
}

/// Stream that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStream;

impl ResponseStream for NullStream {
    fn progress(&self, _message: &str) {}

    fn markdown(&self, _text: &str) {}

    fn button(&self, _button: ButtonSpec) {}
}

/// Stream that records every part, used for replay and tests.
#[derive(Debug, Default)]
pub struct RecordingStream {
    parts: Mutex<Vec<StreamPart>>,
}

impl RecordingStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded parts in write order
    pub fn parts(&self) -> Vec<StreamPart> {
        self.parts.lock().unwrap().clone()
    }

    /// Recorded buttons in write order
    pub fn buttons(&self) -> Vec<ButtonSpec> {
        self.parts
            .lock()
            .unwrap()
            .iter()
            .filter_map(|part| match part {
                StreamPart::Button(button) => Some(button.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.parts.lock().unwrap().clear();
    }

    fn push(&self, part: StreamPart) {
        self.parts.lock().unwrap().push(part);
    }
}

impl ResponseStream for RecordingStream {
    fn progress(&self, message: &str) {
        self.push(StreamPart::Progress(message.to_string()));
    }

    fn markdown(&self, text: &str) {
        self.push(StreamPart::Markdown(text.to_string()));
    }

    fn button(&self, button: ButtonSpec) {
        self.push(StreamPart::Button(button));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_stream_keeps_order() {
        let stream = RecordingStream::new();
        stream.progress("Processing...");
        stream.markdown("Done");
        stream.button(ButtonSpec::new("Open", "workbench.open"));

        let parts = stream.parts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], StreamPart::Progress("Processing...".into()));
        assert_eq!(stream.buttons().len(), 1);

        stream.clear();
        assert!(stream.parts().is_empty());
    }
}
