use patman_core::ResourceState;
use std::fmt;

/// The host-driven operations on a managed PAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Read => "read",
            Operation::Update => "update",
            Operation::Delete => "delete",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the resource exists after an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Present,
    /// No live identity; the host should recreate the resource on its next apply.
    Absent,
}

impl Outcome {
    pub fn of(state: &ResourceState) -> Self {
        if state.is_absent() {
            Outcome::Absent
        } else {
            Outcome::Present
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Outcome::Present)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Present => f.write_str("present"),
            Outcome::Absent => f.write_str("absent"),
        }
    }
}
