//! Activity kinds and code contexts

use serde::{Deserialize, Serialize};

use crate::impl_wire_enum;

/// What the developer is doing.
///
/// `DocumentEdit` and `DocumentFocus` only ever describe events; every other
/// kind except `Event` can also be a live state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    None,
    Idle,
    Building,
    Debugging,
    Coding,
    System,
    Event,
    DocumentEdit,
    DocumentFocus,
}

impl_wire_enum!(ActivityKind {
    None => 0, "none",
    Idle => 1, "idle",
    Building => 2, "building",
    Debugging => 3, "debugging",
    Coding => 4, "coding",
    System => 5, "system",
    Event => 6, "event",
    DocumentEdit => 7, "documentedit",
    DocumentFocus => 8, "documentfocus",
});

impl ActivityKind {
    /// A live state of this kind may keep growing instead of being re-opened.
    pub const fn can_expand(self) -> bool {
        !matches!(self, Self::System | Self::Building | Self::Idle | Self::Debugging)
    }

    /// A state of this kind may be truncated when a more specific one supersedes it.
    pub const fn can_shrink(self) -> bool {
        matches!(self, Self::Debugging | Self::Coding | Self::Idle)
    }

    /// Kinds that can never be the live state of a project.
    pub const fn is_event_only(self) -> bool {
        matches!(self, Self::Event | Self::DocumentEdit | Self::DocumentFocus)
    }

    /// Input that proves the developer is at the keyboard.
    pub const fn is_qualifying_input(self) -> bool {
        matches!(self, Self::Coding | Self::DocumentEdit | Self::DocumentFocus)
    }
}

/// Where in the code an event happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeContext {
    pub project: String,
    pub file: Option<String>,
    pub namespace: Option<String>,
    pub class_name: Option<String>,
    pub member: Option<String>,
    pub line: Option<u32>,
}

impl CodeContext {
    pub fn for_project(project: impl Into<String>) -> Self {
        Self { project: project.into(), ..Self::default() }
    }

    pub fn in_file(project: impl Into<String>, file: impl Into<String>) -> Self {
        Self { project: project.into(), file: Some(file.into()), ..Self::default() }
    }

    /// Structural equality ignoring the caret line.
    pub fn is_equivalent(&self, other: &Self) -> bool {
        self.project == other.project
            && self.file == other.file
            && self.namespace == other.namespace
            && self.class_name == other.class_name
            && self.member == other.member
    }
}
