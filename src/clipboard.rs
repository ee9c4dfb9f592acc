//! OS clipboard access.

use crate::error::{BoxError, Failure};
use tracing::debug;

/// Trait for storing text on the clipboard.
pub trait Clipboard {
    fn write(&mut self, text: &str) -> Result<(), BoxError>;
}

/// Clipboard backed by `arboard`.
///
/// The handle is opened on first write.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn write(&mut self, text: &str) -> Result<(), BoxError> {
        let clipboard = match &mut self.inner {
            Some(clipboard) => clipboard,
            slot @ None => slot.insert(arboard::Clipboard::new()?),
        };
        clipboard.set_text(text.to_string())?;
        debug!("Copied {} bytes to the clipboard", text.len());
        Ok(())
    }
}

/// Writes `text` to `clipboard`, mapping errors into the failure taxonomy.
pub fn copy(clipboard: &mut dyn Clipboard, text: &str) -> Result<(), Failure> {
    clipboard.write(text).map_err(Failure::Clipboard)
}
