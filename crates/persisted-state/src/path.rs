//! Key paths into the untyped state value.
//!
//! A path is an ordered sequence of [`Key`]s: object field names or array
//! indices. Lookup is lenient (any missing step yields `None`), assignment is
//! strict (every intermediate step must already exist).

use std::fmt;

use serde_json::Value;

use crate::error::{StateError, StateResult};

/// One step of a key path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// Object field name.
    Field(String),
    /// Array position.
    Index(usize),
}

impl Key {
    /// Numeric view of the key, used when the parent turns out to be an array.
    /// Field names only count when written in canonical decimal (`0`, `12`).
    fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Field(name) => {
                let canonical = !name.is_empty()
                    && name.bytes().all(|b| b.is_ascii_digit())
                    && (name == "0" || !name.starts_with('0'));
                if canonical { name.parse().ok() } else { None }
            }
        }
    }

    fn get<'a>(&self, parent: &'a Value) -> Option<&'a Value> {
        match (self, parent) {
            (Key::Field(name), Value::Object(map)) => map.get(name),
            (Key::Index(i), Value::Object(map)) => map.get(&i.to_string()),
            (key, Value::Array(items)) => items.get(key.as_index()?),
            _ => None,
        }
    }

    fn get_mut<'a>(&self, parent: &'a mut Value) -> Option<&'a mut Value> {
        match (self, parent) {
            (Key::Field(name), Value::Object(map)) => map.get_mut(name),
            (Key::Index(i), Value::Object(map)) => map.get_mut(&i.to_string()),
            (key, Value::Array(items)) => items.get_mut(key.as_index()?),
            _ => None,
        }
    }

    /// Store `value` under this key. Returns false when `parent` cannot hold it.
    fn put(&self, parent: &mut Value, value: Value) -> bool {
        match (self, parent) {
            (Key::Field(name), Value::Object(map)) => {
                map.insert(name.clone(), value);
                true
            }
            (Key::Index(i), Value::Object(map)) => {
                map.insert(i.to_string(), value);
                true
            }
            (key, Value::Array(items)) => match key.as_index() {
                Some(i) if i < items.len() => {
                    items[i] = value;
                    true
                }
                // Appending is allowed, leaving holes is not.
                Some(i) if i == items.len() => {
                    items.push(value);
                    true
                }
                _ => false,
            },
            _ => false,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Field(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Field(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Field(name)
    }
}

impl From<&String> for Key {
    fn from(name: &String) -> Self {
        Key::Field(name.clone())
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

/// An owned key sequence, displayed dot-separated (`type.fish.0`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct KeyPath(Vec<Key>);

impl KeyPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<Key>) {
        self.0.push(key.into());
    }

    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<Key>> FromIterator<K> for KeyPath {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        KeyPath(iter.into_iter().map(Into::into).collect())
    }
}

impl From<&[Key]> for KeyPath {
    fn from(keys: &[Key]) -> Self {
        KeyPath(keys.to_vec())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// Follow `keys` from `root`.
///
/// Returns `None` as soon as a step is missing, `null`, or not descendable.
/// A `null` leaf is reported as `None` too. An empty path yields `root`.
pub fn lookup<'a>(root: &'a Value, keys: &[Key]) -> Option<&'a Value> {
    keys.iter()
        .try_fold(root, |cursor, key| key.get(cursor))
        .filter(|value| !value.is_null())
}

/// Assign `value` at `keys` inside `root`, in place.
///
/// Every key but the last must resolve to an existing object or array. On
/// failure the error names the prefix up to and including the broken key.
pub fn assign(root: &mut Value, keys: &[Key], value: Value) -> StateResult<()> {
    let Some((last, parents)) = keys.split_last() else {
        return Err(StateError::EmptyPath);
    };

    let mut cursor = root;
    for (depth, key) in parents.iter().enumerate() {
        cursor = match key.get_mut(cursor) {
            Some(next) if next.is_object() || next.is_array() => next,
            _ => return Err(StateError::InvalidPath(KeyPath::from(&keys[..=depth]))),
        };
    }

    if last.put(cursor, value) {
        Ok(())
    } else {
        Err(StateError::InvalidPath(KeyPath::from(keys)))
    }
}
