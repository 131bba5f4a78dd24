#![forbid(unsafe_code)]

//! Tab type registry.
//!
//! The registry maps a [`TabKind`] to everything needed to create a tab of
//! that kind: a display name, an optional icon, and a factory producing the
//! host content. It is built once at startup, either from a static
//! [`TabRegistration`] table or from explicit [`TabRegistry::register`]
//! calls, and is read-only afterwards.

use std::fmt;

use panedock_layout::TabKind;
use rustc_hash::FxHashMap;

use crate::label::{TabInstance, TabLabel};

const LOG_TARGET: &str = "panedock.registry";

/// Host-side content shown in a tab's viewport.
///
/// The window manager calls these hooks on the UI thread; all have empty
/// default bodies.
pub trait TabContent {
    /// Called once after the tab has been docked for the first time.
    fn on_create(&mut self) {}

    /// Called when the tab becomes the selected tab of its leaf.
    fn on_show(&mut self) {}

    /// Called when the tab stops being the selected tab of its leaf.
    fn on_hide(&mut self) {}
}

/// Icon reference resolved by the host renderer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconAsset(String);

impl IconAsset {
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.0
    }
}

/// Factory creating fresh content for a tab kind.
pub type TabFactory = Box<dyn Fn() -> Result<Box<dyn TabContent>, TabCreateError>>;

/// Everything the registry knows about one tab kind.
pub struct TabDescriptor {
    kind: TabKind,
    display_name: String,
    icon: Option<IconAsset>,
    factory: TabFactory,
}

impl TabDescriptor {
    #[must_use]
    pub fn kind(&self) -> &TabKind {
        &self.kind
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    #[must_use]
    pub fn icon(&self) -> Option<&IconAsset> {
        self.icon.as_ref()
    }

    /// Run the factory.
    pub fn create(&self) -> Result<Box<dyn TabContent>, TabCreateError> {
        (self.factory)()
    }
}

impl fmt::Debug for TabDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TabDescriptor")
            .field("kind", &self.kind)
            .field("display_name", &self.display_name)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// One row of a static registration table.
#[derive(Clone, Copy)]
pub struct TabRegistration {
    pub kind: &'static str,
    pub display_name: &'static str,
    pub icon: Option<&'static str>,
    pub factory: fn() -> Result<Box<dyn TabContent>, TabCreateError>,
}

/// Entry for an "add tab" menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry<'a> {
    pub kind: &'a TabKind,
    pub display_name: &'a str,
    pub icon: Option<&'a IconAsset>,
}

/// Failure creating tab content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabCreateError {
    /// An asset the content needs could not be loaded.
    AssetMissing { asset: String },
    /// The factory failed for another reason.
    Factory { message: String },
}

impl fmt::Display for TabCreateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetMissing { asset } => write!(f, "missing asset {asset}"),
            Self::Factory { message } => write!(f, "tab factory failed: {message}"),
        }
    }
}

impl std::error::Error for TabCreateError {}

/// Registry of tab kinds.
#[derive(Debug, Default)]
pub struct TabRegistry {
    entries: FxHashMap<TabKind, TabDescriptor>,
}

impl TabRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a static table. Later rows win on duplicate
    /// identifiers.
    #[must_use]
    pub fn from_table(table: &[TabRegistration]) -> Self {
        let mut registry = Self::new();
        for row in table {
            let factory = row.factory;
            registry.register(
                row.kind,
                row.display_name,
                row.icon.map(IconAsset::new),
                move || factory(),
            );
        }
        registry
    }

    /// Register a tab kind. Re-registering an identifier replaces the
    /// previous entry.
    pub fn register<F>(
        &mut self,
        kind: impl Into<TabKind>,
        display_name: impl Into<String>,
        icon: Option<IconAsset>,
        factory: F,
    ) where
        F: Fn() -> Result<Box<dyn TabContent>, TabCreateError> + 'static,
    {
        let kind = kind.into();
        let descriptor = TabDescriptor {
            kind: kind.clone(),
            display_name: display_name.into(),
            icon,
            factory: Box::new(factory),
        };
        if let Some(previous) = self.entries.insert(kind.clone(), descriptor) {
            tracing::debug!(
                target: LOG_TARGET,
                kind = %kind,
                previous = previous.display_name(),
                "tab kind re-registered, replacing previous entry"
            );
        }
    }

    /// Look up a kind.
    #[must_use]
    pub fn resolve(&self, kind: &TabKind) -> Option<&TabDescriptor> {
        self.entries.get(kind)
    }

    #[must_use]
    pub fn contains(&self, kind: &TabKind) -> bool {
        self.entries.contains_key(kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create fresh content and an unbound label for `kind`.
    ///
    /// Returns `None` and logs a warning when the kind is unknown or its
    /// factory fails.
    #[must_use]
    pub fn instantiate(&self, kind: &TabKind) -> Option<TabInstance> {
        let Some(descriptor) = self.resolve(kind) else {
            tracing::warn!(target: LOG_TARGET, kind = %kind, "no tab registered for kind");
            return None;
        };
        match descriptor.create() {
            Ok(content) => Some(TabInstance::new(
                content,
                TabLabel::new(
                    kind.clone(),
                    descriptor.display_name(),
                    descriptor.icon().cloned(),
                ),
            )),
            Err(err) => {
                tracing::warn!(
                    target: LOG_TARGET,
                    kind = %kind,
                    error = %err,
                    "tab factory failed"
                );
                None
            }
        }
    }

    /// Entries for an "add tab" menu, sorted by display name.
    #[must_use]
    pub fn menu_entries(&self) -> Vec<MenuEntry<'_>> {
        let mut entries: Vec<MenuEntry<'_>> = self
            .entries
            .values()
            .map(|descriptor| MenuEntry {
                kind: descriptor.kind(),
                display_name: descriptor.display_name(),
                icon: descriptor.icon(),
            })
            .collect();
        entries.sort_by(|a, b| {
            a.display_name
                .cmp(b.display_name)
                .then_with(|| a.kind.cmp(b.kind))
        });
        entries
    }
}
