use serde::{Deserialize, Serialize};

/// A chat user taking part in the draft. The core never looks past the id.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Hash)]
pub struct Player {
    pub id: u64,
    pub handle: String,
}

impl Player {
    pub fn new(id: u64, handle: impl Into<String>) -> Self {
        Self {
            id,
            handle: handle.into(),
        }
    }

    pub fn is(&self, other: &Player) -> bool {
        self.id == other.id
    }

    pub fn mention(&self) -> String {
        format!("@{}", self.handle)
    }
}
