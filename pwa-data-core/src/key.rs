//! Mapping keys and paths through a tree

use std::fmt;

use serde::{Deserialize, Serialize};

/// A particle identified by name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticleKey(String);

impl ParticleKey {
    /// Create a particle key
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the particle
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A two-or-more body decay `core -> out1 + out2 + ...`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DecayKey {
    core: ParticleKey,
    outs: Vec<ParticleKey>,
}

impl DecayKey {
    /// Create a decay key from the decaying particle and its products
    pub fn new(core: ParticleKey, outs: Vec<ParticleKey>) -> Self {
        Self { core, outs }
    }

    /// The decaying particle
    pub fn core(&self) -> &ParticleKey {
        &self.core
    }

    /// The decay products, in declaration order
    pub fn outs(&self) -> &[ParticleKey] {
        &self.outs
    }
}

impl fmt::Display for DecayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->", self.core)?;
        for (i, out) in self.outs.iter().enumerate() {
            if i > 0 {
                f.write_str("+")?;
            }
            write!(f, "{out}")?;
        }
        Ok(())
    }
}

/// Key of a mapping entry, or a positional index into a sequence or tuple
///
/// Every key has a canonical string form given by its `Display` impl. Lookups
/// in a mapping fall back to comparing these string forms, so a decay stored
/// under `Key::Decay` can be found with the plain name `"A->R1+B"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Key {
    /// Plain string key
    Name(String),

    /// Integer key; positional when used against a sequence or tuple
    Index(i64),

    /// Particle key
    Particle(ParticleKey),

    /// Decay key
    Decay(DecayKey),
}

impl Key {
    /// The integer value, if this is an index key
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
            Key::Particle(p) => write!(f, "{p}"),
            Key::Decay(d) => write!(f, "{d}"),
        }
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Index(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Index(i64::from(i))
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i as i64)
    }
}

impl From<ParticleKey> for Key {
    fn from(p: ParticleKey) -> Self {
        Key::Particle(p)
    }
}

impl From<DecayKey> for Key {
    fn from(d: DecayKey) -> Self {
        Key::Decay(d)
    }
}

/// An ordered sequence of keys, descending one tree level per key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Path(Vec<Key>);

impl Path {
    /// The empty path, addressing the root
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// A new path extended by one key
    pub fn child(&self, key: impl Into<Key>) -> Self {
        let mut keys = self.0.clone();
        keys.push(key.into());
        Self(keys)
    }

    /// The keys of this path
    pub fn keys(&self) -> &[Key] {
        &self.0
    }

    /// Number of keys in this path
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether this path addresses the root
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

impl From<Key> for Path {
    fn from(key: Key) -> Self {
        Self(vec![key])
    }
}

impl From<&str> for Path {
    fn from(name: &str) -> Self {
        Self(vec![Key::from(name)])
    }
}

impl From<usize> for Path {
    fn from(i: usize) -> Self {
        Self(vec![Key::from(i)])
    }
}

impl From<i64> for Path {
    fn from(i: i64) -> Self {
        Self(vec![Key::from(i)])
    }
}

impl From<Vec<Key>> for Path {
    fn from(keys: Vec<Key>) -> Self {
        Self(keys)
    }
}

impl From<&[Key]> for Path {
    fn from(keys: &[Key]) -> Self {
        Self(keys.to_vec())
    }
}

impl FromIterator<Key> for Path {
    fn from_iter<I: IntoIterator<Item = Key>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Build a [`Path`] from heterogeneous keys
///
/// ```
/// use pwa_data_core::{path, Key};
///
/// let p = path!["decay", 0, "A->R1+B"];
/// assert_eq!(p.keys()[1], Key::Index(0));
/// assert_eq!(p.to_string(), "decay/0/A->R1+B");
/// ```
#[macro_export]
macro_rules! path {
    ($($key:expr),* $(,)?) => {
        $crate::key::Path::from(vec![$($crate::key::Key::from($key)),*])
    };
}
