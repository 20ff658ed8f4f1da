//! # styx-data
//!
//! Values, references and a tree store behind the Styx data explorer.
//!
//! A store maps **references** (absolute paths such as `</config/users>`) to
//! **values**, where a value is either opaque scalar text or an ordered complex
//! value of key/value pairs. Both have a text form that round-trips losslessly.
//!
//! ## Quick start
//!
//! ```rust
//! use styx_data::{explorer, BrowseParams, Datastore, Outcome, Reference};
//!
//! let datastore = Datastore::memory();
//! let mut session = datastore.session().unwrap();
//!
//! // The first browse of an empty store initializes it and redirects.
//! let first = explorer::browse(&mut session, &Reference::root(), BrowseParams::default()).unwrap();
//! assert!(matches!(first, Outcome::Redirect { .. }));
//!
//! explorer::browse(&mut session, &Reference::root(), BrowseParams::add("a", "1")).unwrap();
//! let a = Reference::from_path("/a").unwrap();
//! assert_eq!(explorer::content(&session, &a).unwrap(), Outcome::Page("1".to_string()));
//! ```
//!
//! ## Modules
//!
//! - [`value`]: `Value`, `Complex` and `Pair`
//! - [`parser`]: text → `Value`
//! - [`generator`]: `Value` → text (compact or indented)
//! - [`reference`]: paths into the store
//! - [`store`]: the `Store` contract, memory and file backends
//! - [`explorer`]: browse / view / edit / content operations
//! - [`error`]: error taxonomy

pub mod error;
pub mod explorer;
pub mod generator;
pub mod parser;
pub mod reference;
pub mod store;
pub mod value;

pub use error::{Error, Result};
pub use explorer::{BrowseParams, Outcome};
pub use generator::generate;
pub use parser::parse;
pub use reference::Reference;
pub use store::{Datastore, Session, Store};
pub use value::{Complex, Pair, Value};
