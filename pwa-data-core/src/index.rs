//! Path-based lookup with string-form key fallback

use crate::error::{Error, Result};
use crate::key::{Key, Path};
use crate::tree::{Mapping, Tree};

/// Resolve `path` one key per level, starting at `tree`
///
/// Integer keys address sequence and tuple elements (negative values count
/// from the end). Mapping levels try an exact key match first, then the first
/// key whose string form equals the requested key's string form. The empty
/// path resolves to `tree` itself.
pub fn data_index<L>(tree: &Tree<L>, path: impl Into<Path>) -> Result<&Tree<L>> {
    let path = path.into();
    let mut node = tree;
    for (depth, key) in path.keys().iter().enumerate() {
        let at = Path::from(&path.keys()[..depth]);
        node = index_once(node, key, &at)?;
    }
    Ok(node)
}

fn index_once<'t, L>(node: &'t Tree<L>, key: &Key, at: &Path) -> Result<&'t Tree<L>> {
    match (node, key) {
        (Tree::Sequence(items) | Tree::Tuple(items), Key::Index(i)) => {
            position(*i, items.len())
                .map(|p| &items[p])
                .ok_or_else(|| Error::IndexOutOfRange {
                    path: at.clone(),
                    index: *i,
                    len: items.len(),
                })
        }
        (Tree::Mapping(mapping), _) => lookup(mapping, key).ok_or_else(|| Error::KeyNotFound {
            path: at.clone(),
            key: key.clone(),
        }),
        (other, _) => Err(Error::StructureMismatch {
            path: at.clone(),
            reason: format!("cannot index {} with key '{key}'", other.kind()),
        }),
    }
}

fn position(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 { index + len as i64 } else { index };
    (0..len as i64).contains(&resolved).then_some(resolved as usize)
}

fn lookup<'t, L>(mapping: &'t Mapping<L>, key: &Key) -> Option<&'t Tree<L>> {
    if let Some(value) = mapping.get(key) {
        return Some(value);
    }
    let wanted = key.to_string();
    mapping
        .iter()
        .find(|(k, _)| k.to_string() == wanted)
        .map(|(_, v)| v)
}

impl<L> Tree<L> {
    /// Resolve a single key against this node
    pub fn get(&self, key: impl Into<Key>) -> Result<&Tree<L>> {
        index_once(self, &key.into(), &Path::root())
    }

    /// Method form of [`data_index`]
    pub fn at(&self, path: impl Into<Path>) -> Result<&Tree<L>> {
        data_index(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{DecayKey, ParticleKey};
    use crate::path;

    fn decay(core: &str, outs: &[&str]) -> Key {
        DecayKey::new(ParticleKey::new(core), outs.iter().map(|o| ParticleKey::new(*o)).collect()).into()
    }

    fn sample() -> Tree<u32> {
        let chain = Tree::Mapping(
            [
                (decay("A", &["R1", "B"]), Tree::mapping([("R1", Tree::leaf(1)), ("B", Tree::leaf(2))])),
                (decay("R1", &["C", "D"]), Tree::mapping([("C", Tree::leaf(3)), ("D", Tree::leaf(4))])),
            ]
            .into_iter()
            .collect(),
        );
        Tree::mapping([
            ("particle", Tree::mapping([(ParticleKey::new("A"), Tree::leaf(10))])),
            ("decay", Tree::sequence([chain])),
            ("weight", Tree::leaf(7)),
        ])
    }

    #[test]
    fn test_single_key() {
        let tree = sample();
        assert_eq!(data_index(&tree, "weight").unwrap(), &Tree::leaf(7));
    }

    #[test]
    fn test_multi_step_path() {
        let tree = sample();
        let by_path = data_index(&tree, path!["decay", 0, "A->R1+B", "B"]).unwrap();
        let direct = tree.get("decay").unwrap().get(0).unwrap().get("A->R1+B").unwrap().get("B").unwrap();
        assert_eq!(by_path, direct);
        assert_eq!(by_path, &Tree::leaf(2));
    }

    #[test]
    fn test_string_form_fallback() {
        let tree = sample();
        let by_name = data_index(&tree, path!["particle", "A"]).unwrap();
        let by_key = data_index(&tree, vec![Key::from("particle"), ParticleKey::new("A").into()]).unwrap();
        assert_eq!(by_name, by_key);

        let by_decay = data_index(&tree, vec![Key::from("decay"), Key::from(0), decay("R1", &["C", "D"])]).unwrap();
        assert_eq!(by_decay, data_index(&tree, path!["decay", 0, "R1->C+D"]).unwrap());
    }

    #[test]
    fn test_negative_index() {
        let tree: Tree<u32> = Tree::tuple([Tree::leaf(1), Tree::leaf(2), Tree::leaf(3)]);
        assert_eq!(data_index(&tree, -1i64).unwrap(), &Tree::leaf(3));
    }

    #[test]
    fn test_empty_path_is_root() {
        let tree = sample();
        assert_eq!(data_index(&tree, Path::root()).unwrap(), &tree);
    }

    #[test]
    fn test_errors() {
        let tree = sample();
        match data_index(&tree, path!["particle", "Z"]).unwrap_err() {
            Error::KeyNotFound { path, key } => {
                assert_eq!(path, path!["particle"]);
                assert_eq!(key, Key::from("Z"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(matches!(
            data_index(&tree, path!["decay", 3]),
            Err(Error::IndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(matches!(
            data_index(&tree, path!["decay", "first"]),
            Err(Error::StructureMismatch { .. })
        ));
        assert!(matches!(
            data_index(&tree, path!["weight", 0]),
            Err(Error::StructureMismatch { .. })
        ));
    }
}
