//! Block state for the in-memory world.

use serde::{Deserialize, Serialize};

/// The state of one occupied grid position.
///
/// `kind` names the block (`"berry_bush"`, `"chest"`, ...) and `age` is a
/// generic growth stage that jobs interpret however they like.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockState {
    /// Block identifier.
    pub kind: String,
    /// Growth stage, 0 for freshly placed or non-growing blocks.
    #[serde(default)]
    pub age: u8,
}

impl BlockState {
    /// A block of the given kind at age 0.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            age: 0,
        }
    }

    /// Builder: set the growth stage.
    #[must_use]
    pub const fn with_age(mut self, age: u8) -> Self {
        self.age = age;
        self
    }

    /// Whether this block is of the given kind.
    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }
}
