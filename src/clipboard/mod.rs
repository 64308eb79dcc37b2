//! Clipboard backends.
//!
//! Both operations are best-effort: failures are logged, never returned.

use std::sync::Mutex;

/// The shared clipboard tools read and write.
pub trait Clipboard: Send + Sync {
    /// Replace the clipboard contents.
    fn copy(&self, text: &str);

    /// Current clipboard text, or an empty string when unavailable.
    fn paste(&self) -> String;
}

/// In-process clipboard, for tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Mutex<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contents(text: impl Into<String>) -> Self {
        Self {
            contents: Mutex::new(text.into()),
        }
    }
}

impl Clipboard for MemoryClipboard {
    fn copy(&self, text: &str) {
        match self.contents.lock() {
            Ok(mut contents) => *contents = text.to_string(),
            Err(poisoned) => *poisoned.into_inner() = text.to_string(),
        }
    }

    fn paste(&self) -> String {
        match self.contents.lock() {
            Ok(contents) => contents.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// The operating system clipboard.
///
/// A fresh platform handle is opened for every operation so the type stays
/// `Send + Sync` on every platform.
#[cfg(feature = "clipboard")]
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "clipboard")]
impl Clipboard for SystemClipboard {
    fn copy(&self, text: &str) {
        let result = arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.to_string()));
        if let Err(err) = result {
            tracing::warn!(error = %err, "copying to clipboard failed");
        }
    }

    fn paste(&self) -> String {
        match arboard::Clipboard::new().and_then(|mut cb| cb.get_text()) {
            Ok(text) => text,
            Err(arboard::Error::ContentNotAvailable) => String::new(),
            Err(err) => {
                tracing::warn!(error = %err, "pasting from clipboard failed");
                String::new()
            }
        }
    }
}
