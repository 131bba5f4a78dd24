#![forbid(unsafe_code)]

//! Core: geometry, pointer events, and logging bootstrap.
//!
//! # Role in panedock
//! `panedock-core` holds the host-agnostic primitives shared by the layout
//! engine (`panedock-layout`) and the window manager (`panedock-runtime`).
//! It knows nothing about panels or tabs.

pub mod event;
pub mod geometry;
pub mod logging;

pub use event::{PointerButton, PointerEvent, PointerEventKind};
pub use geometry::{Point, Rect, Sides, Size};
