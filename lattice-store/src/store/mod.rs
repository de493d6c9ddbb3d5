//! Application Store
//!
//! The store is an arbitrary nested `serde_json::Value` owned by a mounted
//! component. Nothing outside the component holds it directly: handlers see
//! it only through a [`Cursor`], which reports every write back to the owner
//! so that the owner can re-render.
//!
//! # Concepts
//!
//! ## Paths
//!
//! A [`Path`] is a sequence of object keys and array indices from the root.
//!
//! ## Cursors
//!
//! A [`Cursor`] pairs the store root with a path and a change callback.
//! Reading through a cursor copies the value at its path. Writing through a
//! cursor updates the root in place and hands the new root to the callback,
//! once per write.

mod cursor;
mod path;

pub use cursor::{ChangeCallback, Cursor};
pub use path::{Path, PathSegment};
