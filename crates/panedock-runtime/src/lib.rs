#![forbid(unsafe_code)]

//! Runtime for panedock: tab registry, tab labels, persistence, and the
//! window manager.
//!
//! # Role in panedock
//! `panedock-runtime` sits on top of the pure model in `panedock-layout`. It
//! owns live tab content through the [`TabContent`] trait, creates it via a
//! [`TabRegistry`], and drives the [`PanelTree`](panedock_layout::PanelTree)
//! from pointer events in [`WindowManager`]. Hosts render from
//! [`WindowManager::layout`] and forward input to
//! [`WindowManager::handle_pointer`].
//!
//! All types here are single-threaded; the manager is meant to live on the
//! host's UI thread.

pub mod label;
pub mod manager;
pub mod persist;
pub mod registry;

pub use label::{LabelDrag, TabInstance, TabLabel, TabLabelError};
pub use manager::{DockError, DragState, PointerEffect, PointerNoopReason, WindowManager};
pub use persist::{PersistError, layout_from_json, layout_to_json, read_layout, write_layout};
pub use registry::{
    IconAsset, MenuEntry, TabContent, TabCreateError, TabDescriptor, TabFactory, TabRegistration,
    TabRegistry,
};
