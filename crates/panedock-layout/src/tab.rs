#![forbid(unsafe_code)]

//! Tab identity.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::panel::{PanelId, PanelModelError};

/// Stable identifier for a tab within one [`PanelTree`](crate::PanelTree).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TabId(u64);

impl TabId {
    /// Lowest valid tab ID.
    pub const MIN: Self = Self(1);

    /// Create a new tab ID, rejecting 0.
    pub fn new(raw: u64) -> Result<Self, PanelModelError> {
        if raw == 0 {
            return Err(PanelModelError::ZeroTabId);
        }
        Ok(Self(raw))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Return the next ID, or an error on overflow.
    pub fn checked_next(self) -> Result<Self, PanelModelError> {
        let Some(next) = self.0.checked_add(1) else {
            return Err(PanelModelError::TabIdOverflow { current: self });
        };
        Self::new(next)
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab#{}", self.0)
    }
}

/// Registry key of a tab type, e.g. `"Scene"` or `"inspector"`.
///
/// The identifier is stored and serialized exactly as written. Comparison,
/// hashing and ordering ignore ASCII case and surrounding whitespace, so
/// `"Scene"` and `" scene "` name the same kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TabKind(String);

impl TabKind {
    #[must_use]
    pub fn new(identifier: impl Into<String>) -> Self {
        Self(identifier.into())
    }

    /// The identifier as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lowercased, trimmed lookup key.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.key().to_ascii_lowercase()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key().is_empty()
    }

    fn key(&self) -> &str {
        self.0.trim()
    }

    fn folded(&self) -> impl Iterator<Item = u8> + '_ {
        self.key().bytes().map(|byte| byte.to_ascii_lowercase())
    }
}

impl PartialEq for TabKind {
    fn eq(&self, other: &Self) -> bool {
        self.key().eq_ignore_ascii_case(other.key())
    }
}

impl Eq for TabKind {}

impl Hash for TabKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for byte in self.folded() {
            state.write_u8(byte);
        }
        state.write_u8(0xff);
    }
}

impl PartialOrd for TabKind {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TabKind {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded().cmp(other.folded())
    }
}

impl From<String> for TabKind {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for TabKind {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<TabKind> for String {
    fn from(value: TabKind) -> Self {
        value.0
    }
}

impl AsRef<str> for TabKind {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TabKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One tab as tracked by the panel tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabRecord {
    id: TabId,
    kind: TabKind,
    panel: PanelId,
}

impl TabRecord {
    pub(crate) fn new(id: TabId, kind: TabKind, panel: PanelId) -> Self {
        Self { id, kind, panel }
    }

    #[must_use]
    pub const fn id(&self) -> TabId {
        self.id
    }

    #[must_use]
    pub fn kind(&self) -> &TabKind {
        &self.kind
    }

    /// Leaf panel currently hosting this tab.
    #[must_use]
    pub const fn panel(&self) -> PanelId {
        self.panel
    }

    pub(crate) fn set_panel(&mut self, panel: PanelId) {
        self.panel = panel;
    }
}
