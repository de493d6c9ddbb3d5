//! Store Paths
//!
//! A path addresses a location inside the store, one segment per level:
//! object keys and array indices. Paths are short in practice, so segments
//! live inline in a `SmallVec` and only spill to the heap for deep nesting.

use std::fmt;

use smallvec::SmallVec;

/// One step into the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object key.
    Key(String),
    /// An array index.
    Index(usize),
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // JSON-pointer escaping so the rendered path is unambiguous.
            Self::Key(key) => f.write_str(&key.replace('~', "~0").replace('/', "~1")),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// A location in the store, relative to the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: SmallVec<[PathSegment; 4]>,
}

impl Path {
    /// The root path.
    pub fn new() -> Self {
        Self::default()
    }

    /// The segments from the root downwards.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// A new path one level below this one.
    pub fn child(&self, segment: impl Into<PathSegment>) -> Self {
        let mut child = self.clone();
        child.segments.push(segment.into());
        child
    }

    /// The path made of the first `len` segments.
    pub(crate) fn prefix(&self, len: usize) -> Self {
        self.segments[..len.min(self.segments.len())]
            .iter()
            .cloned()
            .collect()
    }
}

impl FromIterator<PathSegment> for Path {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_displays_as_slash() {
        assert_eq!(Path::new().to_string(), "/");
        assert!(Path::new().is_root());
    }

    #[test]
    fn child_appends_segments() {
        let path = Path::new().child("todos").child(2).child("title");
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "/todos/2/title");
        assert_eq!(path.prefix(1).to_string(), "/todos");
    }

    #[test]
    fn keys_are_escaped() {
        let path = Path::new().child("a/b").child("c~d");
        assert_eq!(path.to_string(), "/a~1b/c~0d");
    }
}
