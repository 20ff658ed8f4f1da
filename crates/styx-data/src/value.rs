//! The value model: scalars and ordered complex values.
//!
//! A [`Value`] is either a [`Value::Scalar`] holding opaque text or a
//! [`Value::Complex`] holding key/value [`Pair`]s in insertion order. Keys are
//! themselves values, so a complex value may be keyed by other complex values.
//!
//! Entries are kept in a `Vec<Pair>` rather than a hash map: insertion order is the
//! canonical iteration and serialization order, and complex values are small enough
//! in practice that linear key lookup is not a concern.

use std::fmt;

use crate::error::{Error, Result};
use crate::generator;

/// A stored datum.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    /// Opaque text. `a` and `"a"` parse to the same scalar.
    Scalar(String),
    /// Key/value pairs with unique keys, in insertion order.
    Complex(Complex),
}

impl Value {
    pub fn scalar(text: impl Into<String>) -> Self {
        Value::Scalar(text.into())
    }

    /// The empty complex value, `{}`.
    pub fn empty() -> Self {
        Value::Complex(Complex::new())
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Value::Complex(_))
    }

    pub fn as_complex(&self) -> Result<&Complex> {
        match self {
            Value::Complex(complex) => Ok(complex),
            Value::Scalar(_) => Err(self.mismatch("complex")),
        }
    }

    pub fn as_complex_mut(&mut self) -> Result<&mut Complex> {
        match self {
            Value::Complex(complex) => Ok(complex),
            Value::Scalar(_) => Err(self.mismatch("complex")),
        }
    }

    pub fn into_complex(self) -> Result<Complex> {
        match self {
            Value::Complex(complex) => Ok(complex),
            Value::Scalar(_) => Err(self.mismatch("complex")),
        }
    }

    pub fn as_scalar(&self) -> Result<&str> {
        match self {
            Value::Scalar(text) => Ok(text),
            Value::Complex(_) => Err(self.mismatch("scalar")),
        }
    }

    /// Levels of nested complex values, keys included. A scalar is 0, `{}` is 1.
    pub fn depth(&self) -> usize {
        match self {
            Value::Scalar(_) => 0,
            Value::Complex(complex) => {
                1 + complex
                    .iter()
                    .map(|pair| pair.key().depth().max(pair.value().depth()))
                    .max()
                    .unwrap_or(0)
            }
        }
    }

    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Complex(_) => "complex",
        }
    }

    fn mismatch(&self, expected: &'static str) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }
}

/// Compact serialization, identical to `generate(value, false)`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&generator::generate(self, false))
    }
}

impl From<Complex> for Value {
    fn from(complex: Complex) -> Self {
        Value::Complex(complex)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Scalar(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Scalar(text)
    }
}

/// An immutable key/value association.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pair {
    key: Value,
    value: Value,
}

impl Pair {
    pub fn new(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn key(&self) -> &Value {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_parts(self) -> (Value, Value) {
        (self.key, self.value)
    }
}

/// Ordered mapping from unique keys to values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Complex {
    entries: Vec<Pair>,
}

impl Complex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.position(key).map(|i| &self.entries[i].value)
    }

    pub fn get_mut(&mut self, key: &Value) -> Option<&mut Value> {
        self.position(key).map(move |i| &mut self.entries[i].value)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.position(key).is_some()
    }

    /// Insert or replace. A replaced key keeps its original position.
    /// Returns the previous value, if any.
    pub fn put(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].value, value)),
            None => {
                self.entries.push(Pair { key, value });
                None
            }
        }
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.position(key).map(|i| self.entries.remove(i).value)
    }

    /// All entries in insertion order. Each call starts a fresh iteration.
    pub fn iter(&self) -> std::slice::Iter<'_, Pair> {
        self.entries.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|pair| &pair.key)
    }

    fn position(&self, key: &Value) -> Option<usize> {
        self.entries.iter().position(|pair| &pair.key == key)
    }
}

impl<'a> IntoIterator for &'a Complex {
    type Item = &'a Pair;
    type IntoIter = std::slice::Iter<'a, Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl IntoIterator for Complex {
    type Item = Pair;
    type IntoIter = std::vec::IntoIter<Pair>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Collecting keeps the first position of each key and the last value written to it.
impl FromIterator<Pair> for Complex {
    fn from_iter<I: IntoIterator<Item = Pair>>(iter: I) -> Self {
        let mut complex = Complex::new();
        for pair in iter {
            let (key, value) = pair.into_parts();
            complex.put(key, value);
        }
        complex
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Complex {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(k, v)| Pair::new(k, v)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_replaces_in_place() {
        let mut complex: Complex = [("a", "1"), ("b", "2"), ("c", "3")].into_iter().collect();
        let previous = complex.put("a", "9");
        assert_eq!(previous, Some(Value::scalar("1")));
        let keys: Vec<_> = complex.keys().cloned().collect();
        assert_eq!(keys, vec![Value::from("a"), Value::from("b"), Value::from("c")]);
        assert_eq!(complex.get(&Value::from("a")), Some(&Value::from("9")));
    }

    #[test]
    fn remove_missing_key_is_none() {
        let mut complex = Complex::new();
        assert_eq!(complex.remove(&Value::from("x")), None);
        assert!(complex.is_empty());
    }

    #[test]
    fn downcast_scalar_is_type_mismatch() {
        let err = Value::from("x").as_complex().unwrap_err();
        assert!(matches!(
            err,
            Error::TypeMismatch {
                expected: "complex",
                found: "scalar"
            }
        ));
    }

    #[test]
    fn into_complex_and_contains_key() {
        let complex = sample_pairs().into_complex().unwrap();
        assert!(complex.contains_key(&Value::from("x")));
        assert!(!complex.contains_key(&Value::from("z")));
        assert!(matches!(
            Value::from("x").into_complex(),
            Err(Error::TypeMismatch { expected: "complex", found: "scalar" })
        ));
    }

    #[test]
    fn depth_counts_keys_and_values() {
        assert_eq!(Value::from("x").depth(), 0);
        assert_eq!(Value::empty().depth(), 1);
        assert_eq!(sample_pairs().depth(), 1);
        let nested_value: Complex = [("a", Value::Complex(Complex::new()))].into_iter().collect();
        assert_eq!(Value::Complex(nested_value.clone()).depth(), 2);
        let nested_key: Complex = [(Value::Complex(nested_value), Value::from("v"))].into_iter().collect();
        assert_eq!(Value::Complex(nested_key).depth(), 3);
    }

    fn sample_pairs() -> Value {
        Value::Complex([("x", "1"), ("y", "2")].into_iter().collect())
    }

    #[test]
    fn iteration_is_restartable() {
        let complex: Complex = [("x", "1"), ("y", "2")].into_iter().collect();
        assert_eq!(complex.iter().count(), 2);
        assert_eq!(complex.iter().count(), 2);
    }
}
