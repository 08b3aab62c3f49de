//! The message unit carried through the production line.

use serde::{Deserialize, Serialize};

/// A single state-change message published by a producer stage.
///
/// The envelope is immutable once constructed. The queue never inspects
/// the label; only consumers read it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    label: String,
}

impl Envelope {
    /// Wrap a state label.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// The state label this envelope carries.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl std::fmt::Display for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label)
    }
}
