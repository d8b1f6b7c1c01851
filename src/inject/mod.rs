//! Control injection and activation.
//!
//! - [`controller`]: discovery, claiming, insertion and activation
//! - [`control`]: the control's markup and its feedback faces
//! - [`timers`]: the virtual timer queue the controller runs on
//!
//! The host owns the clock and the event loop. It forwards mutation records
//! and timestamps to the [`Controller`], and forwards control activations
//! (clicks) as node ids.

mod control;
mod controller;
mod timers;

pub use control::{CLAIM_ATTR, CONTROL_LABEL, CONTROL_MARKER, Control, Face, is_control};
pub use controller::{Activation, Controller, observation_root};
pub use timers::{TimerId, Timers};

/// Clipboard write failure, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct ClipboardError(pub String);

/// The clipboard boundary.
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// In-memory clipboard that keeps every write.
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    writes: Vec<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// The most recent write.
    pub fn contents(&self) -> Option<&str> {
        self.writes.last().map(String::as_str)
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.writes.push(text.to_string());
        Ok(())
    }
}

impl<C: Clipboard + ?Sized> Clipboard for Box<C> {
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        (**self).write_text(text)
    }
}
