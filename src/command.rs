//! Commands and types shared by every viewgrid component.
//!
//! [`Command`] describes every change the workspace controller can apply to
//! the viewport layout.  [`ViewportId`] and [`TabIndex`] are the values
//! those commands carry.
//!
//! The UI shell forwards raw values; the daemon accepts tab indices either
//! as JSON numbers or as numeric strings, and tolerates negative indices
//! (they are treated as stale and ignored).

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Opaque identifier of one rendering viewport.
///
/// No structure is assumed; two ids are the same viewport iff their strings
/// are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ViewportId(String);

impl ViewportId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ViewportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ViewportId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ViewportId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Wire format for SetActiveTab: accepts a (possibly negative) number or a
/// numeric string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TabIndex(pub i64);

impl TabIndex {
    /// The index as a `usize`, or `None` if it is negative.
    pub fn to_usize(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }
}

impl fmt::Display for TabIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for TabIndex {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = TabIndex;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "integer or numeric string")
            }
            fn visit_i64<E>(self, n: i64) -> Result<TabIndex, E> {
                Ok(TabIndex(n))
            }
            fn visit_u64<E>(self, n: u64) -> Result<TabIndex, E>
            where
                E: DeError,
            {
                i64::try_from(n)
                    .map(TabIndex)
                    .map_err(|_| DeError::custom("SetActiveTab: index too large"))
            }
            fn visit_str<E>(self, s: &str) -> Result<TabIndex, E>
            where
                E: DeError,
            {
                let n: i64 = s
                    .trim()
                    .parse()
                    .map_err(|_| DeError::custom("SetActiveTab: expected an integer"))?;
                Ok(TabIndex(n))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Every change the workspace controller can apply.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and consumed by the
/// [`WorkspaceController`](crate::workspace::WorkspaceController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// A viewport was created; place it in the grid.
    Add(ViewportId),

    /// A viewport was closed; take it out of the grid.
    Remove(ViewportId),

    /// The user picked a tab in the tab strip.
    ///
    /// Stale or negative indices are ignored.
    SetActiveTab(TabIndex),

    /// The workspace was torn down.
    ///
    /// On the wire this is the JSON string `"Reset"`.
    Reset,

    /// Rebuild the layout from the UI's viewport registry, in order.
    Sync(Vec<ViewportId>),

    /// Publish the current layout again without changing it.
    Snapshot,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Add(id) => write!(f, "add {}", id),
            Command::Remove(id) => write!(f, "remove {}", id),
            Command::SetActiveTab(idx) => write!(f, "set active tab {}", idx),
            Command::Reset => write!(f, "reset"),
            Command::Sync(ids) => write!(f, "sync {} viewport(s)", ids.len()),
            Command::Snapshot => write!(f, "snapshot"),
        }
    }
}
