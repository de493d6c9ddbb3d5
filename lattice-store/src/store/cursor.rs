//! Store Cursor
//!
//! A cursor is a scoped, mutation-notifying view onto one location of the
//! store. It is the only way handlers reach the store.
//!
//! # How Cursors Work
//!
//! 1. A root cursor is created over a store value together with a change
//!    callback.
//!
//! 2. `refine` produces a cursor one level deeper. Refined cursors share the
//!    root and the callback of the cursor they came from.
//!
//! 3. Every mutation call applies its change to the shared root and then
//!    invokes the callback exactly once with the new root value. A failed
//!    mutation leaves the root untouched and does not call back.
//!
//! Because refined cursors share the root, several mutations made during one
//! handler compose: the second one sees the result of the first.
//!
//! # Locking
//!
//! The root lock is released before the callback runs, so a callback may read
//! from the cursor again (or create a new one) without deadlocking.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::trace;

use super::path::{Path, PathSegment};
use crate::error::{StoreError, StoreResult};

/// Callback invoked with the new root value after every mutation.
pub type ChangeCallback = Arc<dyn Fn(Value) + Send + Sync>;

/// A scoped view onto the store that reports every write.
///
/// # Example
///
/// ```rust
/// use lattice_store::store::Cursor;
/// use serde_json::json;
///
/// let cursor = Cursor::new(json!({"letters": ["a", "b"]}), |root| {
///     println!("store is now {root}");
/// });
///
/// cursor.refine("letters").unshift("c").unwrap();
/// assert_eq!(cursor.get(), json!({"letters": ["c", "a", "b"]}));
/// ```
#[derive(Clone)]
pub struct Cursor {
    /// The store root, shared by every cursor refined from the same origin.
    root: Arc<RwLock<Value>>,

    /// Where this cursor points, relative to the root.
    path: Path,

    on_change: ChangeCallback,
}

impl Cursor {
    /// Create a root cursor over `value`.
    pub fn new<F>(value: Value, on_change: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        Self::with_callback(value, Arc::new(on_change))
    }

    /// Create a root cursor from an already shared callback.
    pub fn with_callback(value: Value, on_change: ChangeCallback) -> Self {
        Self {
            root: Arc::new(RwLock::new(value)),
            path: Path::new(),
            on_change,
        }
    }

    /// A cursor one level below this one.
    pub fn refine(&self, segment: impl Into<PathSegment>) -> Self {
        Self {
            root: Arc::clone(&self.root),
            path: self.path.child(segment),
            on_change: Arc::clone(&self.on_change),
        }
    }

    /// A cursor several levels below this one.
    pub fn refine_path<I, S>(&self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PathSegment>,
    {
        let path = self
            .path
            .segments()
            .iter()
            .cloned()
            .chain(segments.into_iter().map(Into::into))
            .collect();
        Self {
            root: Arc::clone(&self.root),
            path,
            on_change: Arc::clone(&self.on_change),
        }
    }

    /// The location this cursor points at.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether two cursors share the same root.
    pub fn same_root(&self, other: &Cursor) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }

    /// A copy of the value at this cursor, or `Value::Null` if the path does
    /// not resolve.
    pub fn get(&self) -> Value {
        let root = self.root.read();
        resolve(&root, &self.path).cloned().unwrap_or(Value::Null)
    }

    /// The value at this cursor, failing if the path does not resolve.
    pub fn try_get(&self) -> StoreResult<Value> {
        let root = self.root.read();
        resolve(&root, &self.path).cloned()
    }

    /// The value at this cursor, deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self) -> StoreResult<T> {
        Ok(serde_json::from_value(self.try_get()?)?)
    }

    /// A copy of the whole store.
    pub fn root(&self) -> Value {
        self.root.read().clone()
    }

    /// Replace the value at this cursor.
    ///
    /// A missing final object key is inserted; every other segment must
    /// already exist.
    pub fn set(&self, value: impl Into<Value>) -> StoreResult<()> {
        let value = value.into();
        if self.path.is_root() {
            return self.write("set", move |target, _| {
                *target = value;
                Ok(())
            });
        }
        self.write_at_parent("set", move |parent, last, path| match (parent, last) {
            (Value::Object(map), PathSegment::Key(key)) => {
                map.insert(key.clone(), value);
                Ok(())
            }
            (Value::Array(items), PathSegment::Index(index)) => {
                let len = items.len();
                match items.get_mut(*index) {
                    Some(slot) => {
                        *slot = value;
                        Ok(())
                    }
                    None => Err(StoreError::IndexOutOfBounds {
                        path: path.clone(),
                        index: *index,
                        len,
                    }),
                }
            }
            (other, PathSegment::Key(_)) => Err(mismatch(path, "object", other)),
            (other, PathSegment::Index(_)) => Err(mismatch(path, "array", other)),
        })
    }

    /// Shallow-merge `fields` into the object at this cursor.
    pub fn merge(&self, fields: Map<String, Value>) -> StoreResult<()> {
        self.write("merge", move |target, path| match target {
            Value::Object(map) => {
                map.extend(fields);
                Ok(())
            }
            other => Err(mismatch(path, "object", other)),
        })
    }

    /// Append to the array at this cursor.
    pub fn push(&self, value: impl Into<Value>) -> StoreResult<()> {
        let value = value.into();
        self.write("push", move |target, path| {
            as_array(target, path)?.push(value);
            Ok(())
        })
    }

    /// Prepend to the array at this cursor.
    pub fn unshift(&self, value: impl Into<Value>) -> StoreResult<()> {
        let value = value.into();
        self.write("unshift", move |target, path| {
            as_array(target, path)?.insert(0, value);
            Ok(())
        })
    }

    /// Remove `delete_count` elements starting at `start` from the array at
    /// this cursor and insert `items` in their place.
    ///
    /// `delete_count` is clamped to the end of the array. Returns the removed
    /// elements.
    pub fn splice(&self, start: usize, delete_count: usize, items: Vec<Value>) -> StoreResult<Vec<Value>> {
        self.write("splice", move |target, path| {
            let array = as_array(target, path)?;
            let len = array.len();
            if start > len {
                return Err(StoreError::IndexOutOfBounds {
                    path: path.child(start),
                    index: start,
                    len,
                });
            }
            let end = start.saturating_add(delete_count).min(len);
            Ok(array.splice(start..end, items).collect())
        })
    }

    /// Remove the first element equal to `value` from the array at this
    /// cursor. Returns whether anything was removed.
    ///
    /// Nothing is reported to the change callback when no element matched.
    pub fn remove(&self, value: &Value) -> StoreResult<bool> {
        let position = {
            let root = self.root.read();
            let target = resolve(&root, &self.path)?;
            match target {
                Value::Array(items) => items.iter().position(|item| item == value),
                other => return Err(mismatch(&self.path, "array", other)),
            }
        };
        match position {
            Some(index) => {
                self.splice(index, 1, Vec::new())?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove `key` from the object at this cursor, returning its value.
    pub fn delete(&self, key: &str) -> StoreResult<Option<Value>> {
        let present = {
            let root = self.root.read();
            match resolve(&root, &self.path)? {
                Value::Object(map) => map.contains_key(key),
                other => return Err(mismatch(&self.path, "object", other)),
            }
        };
        if !present {
            return Ok(None);
        }
        self.write("delete", |target, path| match target {
            Value::Object(map) => Ok(map.shift_remove(key)),
            other => Err(mismatch(path, "object", other)),
        })
    }

    /// Replace the value at this cursor with `f(current)`.
    pub fn apply<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(Value) -> Value,
    {
        let current = self.try_get()?;
        self.set(f(current))
    }

    /// Run `op` on the value at this cursor, then report the new root.
    fn write<R, F>(&self, op: &'static str, f: F) -> StoreResult<R>
    where
        F: FnOnce(&mut Value, &Path) -> StoreResult<R>,
    {
        let (result, snapshot) = {
            let mut root = self.root.write();
            let target = resolve_mut(&mut root, &self.path)?;
            let result = f(target, &self.path)?;
            (result, root.clone())
        };
        self.notify(op, snapshot);
        Ok(result)
    }

    /// Run `op` on the parent of this cursor's location.
    fn write_at_parent<F>(&self, op: &'static str, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Value, &PathSegment, &Path) -> StoreResult<()>,
    {
        let Some(last) = self.path.segments().last() else {
            // The root has no parent.
            return Err(StoreError::PathNotFound { path: Path::new() });
        };
        let parent_path = self.path.prefix(self.path.len() - 1);
        let snapshot = {
            let mut root = self.root.write();
            let parent = resolve_mut(&mut root, &parent_path)?;
            f(parent, last, &self.path)?;
            root.clone()
        };
        self.notify(op, snapshot);
        Ok(())
    }

    fn notify(&self, op: &'static str, snapshot: Value) {
        trace!(op, path = %self.path, "store mutated");
        (self.on_change)(snapshot);
    }
}

impl fmt::Debug for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("path", &self.path.to_string())
            .field("value", &self.get())
            .finish()
    }
}

/// Name of a JSON value's kind, for error messages.
fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(path: &Path, expected: &'static str, found: &Value) -> StoreError {
    StoreError::TypeMismatch {
        path: path.clone(),
        expected,
        found: kind_of(found),
    }
}

fn as_array<'a>(target: &'a mut Value, path: &Path) -> StoreResult<&'a mut Vec<Value>> {
    match target {
        Value::Array(items) => Ok(items),
        other => Err(mismatch(path, "array", other)),
    }
}

fn resolve<'a>(root: &'a Value, path: &Path) -> StoreResult<&'a Value> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        let here = || path.prefix(depth + 1);
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map
                .get(key)
                .ok_or_else(|| StoreError::PathNotFound { path: here() })?,
            (Value::Array(items), PathSegment::Index(index)) => {
                items.get(*index).ok_or_else(|| StoreError::IndexOutOfBounds {
                    path: here(),
                    index: *index,
                    len: items.len(),
                })?
            }
            (other, PathSegment::Key(_)) => return Err(mismatch(&path.prefix(depth), "object", other)),
            (other, PathSegment::Index(_)) => return Err(mismatch(&path.prefix(depth), "array", other)),
        };
    }
    Ok(current)
}

fn resolve_mut<'a>(root: &'a mut Value, path: &Path) -> StoreResult<&'a mut Value> {
    let mut current = root;
    for (depth, segment) in path.segments().iter().enumerate() {
        current = match (current, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map
                .get_mut(key)
                .ok_or_else(|| StoreError::PathNotFound {
                    path: path.prefix(depth + 1),
                })?,
            (Value::Array(items), PathSegment::Index(index)) => {
                let len = items.len();
                items
                    .get_mut(*index)
                    .ok_or_else(|| StoreError::IndexOutOfBounds {
                        path: path.prefix(depth + 1),
                        index: *index,
                        len,
                    })?
            }
            (other, PathSegment::Key(_)) => return Err(mismatch(&path.prefix(depth), "object", other)),
            (other, PathSegment::Index(_)) => return Err(mismatch(&path.prefix(depth), "array", other)),
        };
    }
    Ok(current)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
