//! The store contract and its two backends.
//!
//! [`Store`] is everything the explorer needs from persistence: read a value,
//! write or delete a value, and list the children of a complex value. The rules
//! for how a write lands in the tree live here once, in [`lookup`] and [`update`],
//! and both backends share them:
//!
//! - `memory:` keeps the tree in process memory,
//! - `file:<path>` (or a bare path) keeps the whole tree as indented value text in
//!   one file, reloaded when a session opens and rewritten atomically on each write.
//!
//! A [`Datastore`] is opened once and shared; every operation acquires a
//! [`Session`] and drops it when done. The session holds the store lock for its
//! lifetime, so the lock is released on every exit path, early returns and errors
//! included.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;

use crate::error::{Error, Result};
use crate::generator::generate;
use crate::parser::{parse, MAX_DEPTH};
use crate::reference::Reference;
use crate::value::{Pair, Value};

/// Tree-structured persistence addressed by [`Reference`]s.
pub trait Store {
    /// The value stored at `reference`, or `None` if there is none.
    fn read(&self, reference: &Reference) -> Result<Option<Value>>;

    /// Store `value` at `reference`; `None` deletes the entry.
    ///
    /// Fails with [`Error::InvalidAccess`] if the parent of `reference` is not an
    /// existing complex value. Deleting a key that is not there succeeds.
    fn write(&mut self, reference: &Reference, value: Option<Value>) -> Result<()>;

    /// The immediate children of the complex value at `reference`.
    ///
    /// Fails with [`Error::InvalidAccess`] if there is no complex value there,
    /// which includes a store that has never been written to.
    fn browse(&self, reference: &Reference) -> Result<Vec<Pair>> {
        match self.read(reference)? {
            Some(Value::Complex(complex)) => Ok(complex.into_iter().collect()),
            _ => Err(Error::InvalidAccess(reference.to_string())),
        }
    }
}

/// Find the value addressed by `reference` in a tree.
pub fn lookup<'a>(root: Option<&'a Value>, reference: &Reference) -> Option<&'a Value> {
    let mut node = root?;
    for segment in reference.segments() {
        node = node.as_complex().ok()?.get(segment)?;
    }
    Some(node)
}

/// Apply a single write to a tree. The tree is untouched when this fails.
///
/// A write that would nest the tree deeper than the parser accepts fails with
/// [`Error::TooDeep`], so a saved tree always loads again.
pub fn update(root: &mut Option<Value>, reference: &Reference, value: Option<Value>) -> Result<()> {
    if let Some(value) = &value {
        check_depth(reference, value)?;
    }
    let Some((key, parent_segments)) = reference.segments().split_last() else {
        *root = value;
        return Ok(());
    };
    let invalid = || Error::InvalidAccess(Reference::from_segments(parent_segments.iter().cloned()).to_string());
    let mut node = root.as_mut().ok_or_else(invalid)?;
    for segment in parent_segments {
        node = node
            .as_complex_mut()
            .ok()
            .and_then(|complex| complex.get_mut(segment))
            .ok_or_else(invalid)?;
    }
    let parent = node.as_complex_mut().map_err(|_| invalid())?;
    match value {
        Some(value) => {
            parent.put(key.clone(), value);
        }
        None => {
            parent.remove(key);
        }
    }
    Ok(())
}

/// Nesting of `value` once stored at `reference`: each segment sits one level
/// deeper than the previous, and the value below the last.
fn check_depth(reference: &Reference, value: &Value) -> Result<()> {
    let segments = reference.segments();
    let depth = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| i + 1 + segment.depth())
        .chain(std::iter::once(segments.len() + value.depth()))
        .max()
        .unwrap_or(0);
    if depth > MAX_DEPTH {
        return Err(Error::TooDeep {
            reference: reference.to_string(),
            depth,
            limit: MAX_DEPTH,
        });
    }
    Ok(())
}

/// Number of pairs in a tree, counting nested complex values recursively.
pub fn count_entries(value: &Value) -> usize {
    match value {
        Value::Scalar(_) => 0,
        Value::Complex(complex) => complex
            .iter()
            .map(|pair| 1 + count_entries(pair.value()))
            .sum(),
    }
}

#[derive(Debug)]
enum Backend {
    Memory,
    File(PathBuf),
}

#[derive(Debug)]
struct Shared {
    url: String,
    backend: Backend,
    tree: Mutex<Option<Value>>,
}

/// A shared handle to an opened store. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Datastore {
    inner: Arc<Shared>,
}

impl Datastore {
    /// Open a store by URL: `memory:`, `file:<path>`, or a plain file path.
    pub fn open(url: &str) -> Result<Self> {
        let backend = if let Some(rest) = url.strip_prefix("memory:") {
            if !rest.is_empty() {
                return Err(Error::UnsupportedStore(url.to_string()));
            }
            Backend::Memory
        } else if let Some(path) = url.strip_prefix("file:") {
            Backend::File(PathBuf::from(path))
        } else if has_scheme(url) {
            return Err(Error::UnsupportedStore(url.to_string()));
        } else {
            Backend::File(PathBuf::from(url))
        };
        debug!("Opened datastore {url} ({backend:?})");
        Ok(Self {
            inner: Arc::new(Shared {
                url: url.to_string(),
                backend,
                tree: Mutex::new(None),
            }),
        })
    }

    /// A fresh in-memory store.
    pub fn memory() -> Self {
        Self {
            inner: Arc::new(Shared {
                url: "memory:".to_string(),
                backend: Backend::Memory,
                tree: Mutex::new(None),
            }),
        }
    }

    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Acquire the store for one operation.
    pub fn session(&self) -> Result<Session<'_>> {
        let mut tree = self
            .inner
            .tree
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Backend::File(path) = &self.inner.backend {
            *tree = load_file(path)?;
        }
        debug!("Session opened on {}", self.inner.url);
        Ok(Session {
            tree,
            shared: &self.inner,
        })
    }

    /// Write the whole tree to `destination` as indented text.
    /// Returns the number of entries written.
    pub fn export_to(&self, destination: &Path) -> Result<usize> {
        let session = self.session()?;
        let root = session.read(&Reference::root())?;
        let (text, count) = match &root {
            Some(value) => (format!("{}\n", generate(value, true)), count_entries(value)),
            None => (String::new(), 0),
        };
        fs::write(destination, text)?;
        Ok(count)
    }

    /// Replace the whole tree with the value read from `source`. An empty file
    /// clears the store. Returns the number of entries read.
    pub fn import_from(&self, source: &Path) -> Result<usize> {
        let text = fs::read_to_string(source)?;
        let root = if text.trim().is_empty() {
            None
        } else {
            Some(parse(&text)?)
        };
        let count = root.as_ref().map_or(0, count_entries);
        let mut session = self.session()?;
        session.write(&Reference::root(), root)?;
        Ok(count)
    }
}

/// Exclusive access to a [`Datastore`] for the duration of one operation.
pub struct Session<'a> {
    tree: MutexGuard<'a, Option<Value>>,
    shared: &'a Shared,
}

impl Store for Session<'_> {
    fn read(&self, reference: &Reference) -> Result<Option<Value>> {
        Ok(lookup(self.tree.as_ref(), reference).cloned())
    }

    fn write(&mut self, reference: &Reference, value: Option<Value>) -> Result<()> {
        match &self.shared.backend {
            Backend::Memory => update(&mut self.tree, reference, value),
            Backend::File(path) => {
                let mut next = self.tree.clone();
                update(&mut next, reference, value)?;
                save_file(path, next.as_ref())?;
                *self.tree = next;
                Ok(())
            }
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        debug!("Session closed on {}", self.shared.url);
    }
}

/// `lmdb:...`, `jdbc:h2:...` and similar name backends we do not have.
/// Single-letter prefixes are drive letters, not schemes.
fn has_scheme(url: &str) -> bool {
    match url.find(':') {
        Some(colon) if colon > 1 => url[..colon]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')),
        _ => false,
    }
}

fn load_file(path: &Path) -> Result<Option<Value>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    if text.trim().is_empty() {
        return Ok(None);
    }
    parse(&text).map(Some)
}

/// Replace the file contents atomically: write a sibling temp file, then rename.
fn save_file(path: &Path, root: Option<&Value>) -> Result<()> {
    let Some(root) = root else {
        if path.exists() {
            fs::remove_file(path)?;
        }
        return Ok(());
    };
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, format!("{}\n", generate(root, true)))?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_detection() {
        assert!(has_scheme("lmdb:data/datastore.lmdb"));
        assert!(has_scheme("jdbc:h2:./datastore"));
        assert!(!has_scheme("C:\\data\\store.styx"));
        assert!(!has_scheme("data/store.styx"));
    }

    #[test]
    fn update_on_missing_parent_leaves_tree_untouched() {
        let mut root = Some(Value::empty());
        let reference = Reference::root().child("a").child("b");
        let err = update(&mut root, &reference, Some(Value::from("1"))).unwrap_err();
        assert!(matches!(err, Error::InvalidAccess(ref r) if r == "</a>"));
        assert_eq!(root, Some(Value::empty()));
    }

    #[test]
    fn count_entries_is_recursive() {
        let value = parse("{a:1,b:{c:2,d:3}}").unwrap();
        assert_eq!(count_entries(&value), 4);
    }
}
