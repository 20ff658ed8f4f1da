//! The navigation and edit protocol behind the explorer's pages.
//!
//! Each operation takes a [`Store`] for its whole duration, applies at most one
//! mutation, and returns an [`Outcome`] carrying a statically-shaped page record.
//! Textual input is always parsed in full before anything is written, so a parse
//! error never leaves a partial change behind.

use log::info;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::generator::generate;
use crate::parser::parse;
use crate::reference::Reference;
use crate::store::Store;
use crate::value::{Pair, Value};

/// Result of an explorer operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Page(T),
    /// Ask the client to navigate to this browse path.
    Redirect { location: String },
    NotFound,
}

impl<T> Outcome<T> {
    pub fn page(self) -> Option<T> {
        match self {
            Outcome::Page(page) => Some(page),
            _ => None,
        }
    }
}

/// Optional mutation parameters of a browse request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseParams {
    pub add_key: Option<String>,
    pub add_val: Option<String>,
    pub del_key: Option<String>,
}

impl BrowseParams {
    pub fn add(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            add_key: Some(key.into()),
            add_val: Some(value.into()),
            del_key: None,
        }
    }

    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            del_key: Some(key.into()),
            ..Self::default()
        }
    }

    fn is_add(&self) -> bool {
        self.add_key.is_some() || self.add_val.is_some()
    }
}

/// Navigation links shared by every page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    /// The reference literal, e.g. `</a/b>`.
    pub self_text: String,
    /// URL path suffix of this reference, e.g. `/a/b`.
    pub self_ref: String,
    /// URL path suffix of the parent, absent at the root.
    pub parent_ref: Option<String>,
}

impl Location {
    fn of(reference: &Reference) -> Self {
        Self {
            self_text: reference.to_string(),
            self_ref: reference.to_path(),
            parent_ref: reference.parent().map(|parent| parent.to_path()),
        }
    }
}

/// What a browse listing shows for a child's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum EntryValue {
    /// The child is complex and can be browsed into.
    Nested,
    /// The child is a scalar, shown serialized.
    Leaf(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    pub key_text: String,
    /// URL path suffix of the child.
    pub child_ref: String,
    pub value: EntryValue,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrowsePage {
    #[serde(flatten)]
    pub location: Location,
    pub error: Option<String>,
    pub entries: Vec<Entry>,
    /// Add-form texts kept for redisplay after a failed add.
    pub add_key: Option<String>,
    pub add_val: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewPage {
    #[serde(flatten)]
    pub location: Location,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditPage {
    #[serde(flatten)]
    pub location: Location,
    pub error: Option<String>,
    /// Current value, or the submitted text when storing it failed.
    pub content: String,
}

/// List the children of a complex value, optionally adding or deleting one first.
///
/// Browsing the root of a store that was never written to initializes it with
/// `{}` and redirects back to the root listing. A root holding a scalar is left
/// alone and reported as not found, like any other scalar.
pub fn browse(store: &mut dyn Store, reference: &Reference, params: BrowseParams) -> Result<Outcome<BrowsePage>> {
    let BrowseParams {
        mut add_key,
        mut add_val,
        del_key,
    } = params.clone();
    let mut error = None;

    if params.is_add() {
        info!("Add {reference}");
        match add_child(store, reference, add_key.as_deref(), add_val.as_deref()) {
            Ok(()) => {
                add_key = None;
                add_val = None;
            }
            Err(e) if is_recoverable(&e) => error = Some(format!("Failed to add: {e}")),
            Err(e) => return Err(e),
        }
    } else if let Some(key) = del_key.as_deref() {
        info!("Del {reference}");
        let deleted = parse(key).and_then(|key| store.write(&reference.child(key), None));
        match deleted {
            Ok(()) => {}
            Err(e) if is_recoverable(&e) => error = Some(format!("Failed to delete: {e}")),
            Err(e) => return Err(e),
        }
    } else {
        info!("Browse {reference}");
    }

    let children = match store.browse(reference) {
        Ok(children) => children,
        Err(Error::InvalidAccess(_)) if reference.is_root() && store.read(reference)?.is_none() => {
            info!("Initializing empty store at {reference}");
            store.write(reference, Some(Value::empty()))?;
            return Ok(Outcome::Redirect {
                location: browse_location(reference),
            });
        }
        Err(Error::InvalidAccess(_)) => return Ok(Outcome::NotFound),
        Err(e) => return Err(e),
    };

    Ok(Outcome::Page(BrowsePage {
        location: Location::of(reference),
        error,
        entries: children.iter().map(|pair| entry(reference, pair)).collect(),
        add_key,
        add_val,
    }))
}

/// Show the indented serialization of the value at `reference`.
pub fn view(store: &dyn Store, reference: &Reference) -> Result<Outcome<ViewPage>> {
    info!("View {reference}");
    Ok(match store.read(reference)? {
        Some(value) => Outcome::Page(ViewPage {
            location: Location::of(reference),
            content: generate(&value, true),
        }),
        None => Outcome::NotFound,
    })
}

/// Show the value at `reference` for editing, replacing it first when `content`
/// is given.
///
/// If `content` does not parse (or cannot be stored), nothing is written and the
/// page carries the error together with the submitted text.
pub fn edit(store: &mut dyn Store, reference: &Reference, content: Option<String>) -> Result<Outcome<EditPage>> {
    if let Some(submitted) = content {
        info!("Store {reference}");
        let stored = parse(&submitted).and_then(|value| store.write(reference, Some(value)));
        match stored {
            Ok(()) => {}
            Err(e) if is_recoverable(&e) => {
                return Ok(Outcome::Page(EditPage {
                    location: Location::of(reference),
                    error: Some(format!("Failed to store: {e}")),
                    content: submitted,
                }));
            }
            Err(e) => return Err(e),
        }
    } else {
        info!("Edit {reference}");
    }

    Ok(match store.read(reference)? {
        Some(value) => Outcome::Page(EditPage {
            location: Location::of(reference),
            error: None,
            content: generate(&value, true),
        }),
        None => Outcome::NotFound,
    })
}

/// The raw serialized value at `reference`, for download.
pub fn content(store: &dyn Store, reference: &Reference) -> Result<Outcome<String>> {
    info!("Get Content {reference}");
    Ok(match store.read(reference)? {
        Some(value) => Outcome::Page(generate(&value, true)),
        None => Outcome::NotFound,
    })
}

/// The browse location for a reference, as used in redirects.
pub fn browse_location(reference: &Reference) -> String {
    format!("/browse{}", reference.to_path())
}

fn add_child(store: &mut dyn Store, reference: &Reference, key: Option<&str>, value: Option<&str>) -> Result<()> {
    let (Some(key), Some(value)) = (key, value) else {
        return Err(Error::Parse {
            line: 1,
            column: 1,
            message: "both a key and a value are required".to_string(),
        });
    };
    let key = parse(key)?;
    let value = parse(value)?;
    store.write(&reference.child(key), Some(value))
}

fn entry(reference: &Reference, pair: &Pair) -> Entry {
    let value = match pair.value() {
        Value::Complex(_) => EntryValue::Nested,
        scalar => EntryValue::Leaf(generate(scalar, false)),
    };
    Entry {
        key_text: generate(pair.key(), false),
        child_ref: reference.child(pair.key().clone()).to_path(),
        value,
    }
}

/// Input errors are shown to the user; anything else is a failure of the store.
fn is_recoverable(error: &Error) -> bool {
    matches!(
        error,
        Error::Parse { .. }
            | Error::InvalidAccess(_)
            | Error::TypeMismatch { .. }
            | Error::TooDeep { .. }
    )
}
