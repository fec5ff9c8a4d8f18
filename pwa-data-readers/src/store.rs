//! Saving and loading whole trees

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use pwa_data_core::Tree;

use crate::error::Result;

/// Write `tree` to `path` with bincode, replacing any existing file
pub fn save_data<L: Serialize>(path: impl AsRef<Path>, tree: &Tree<L>) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, tree)?;
    writer.flush()?;

    debug!(path = %path.display(), leaves = tree.leaves().count(), "saved tree");
    Ok(())
}

/// Read a tree written by [`save_data`]
pub fn load_data<L: DeserializeOwned>(path: impl AsRef<Path>) -> Result<Tree<L>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let tree: Tree<L> = bincode::deserialize_from(reader)?;

    debug!(path = %path.display(), leaves = tree.leaves().count(), "loaded tree");
    Ok(tree)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use ndarray::{array, ArrayD};
    use pwa_data_core::{DecayKey, Key, ParticleKey};

    fn sample() -> Tree<ArrayD<f64>> {
        let decay = DecayKey::new(ParticleKey::new("A"), vec![ParticleKey::new("R1"), ParticleKey::new("B")]);
        Tree::mapping([
            (Key::from(ParticleKey::new("B")), Tree::mapping([
                ("p", Tree::leaf(array![[1.0, 0.0, 0.0, 0.5], [2.0, 0.1, 0.2, 0.3]].into_dyn())),
                ("m", Tree::leaf(array![0.5, 0.5].into_dyn())),
            ])),
            (Key::from("decay"), Tree::sequence([Tree::mapping([(
                decay,
                Tree::tuple([Tree::leaf(array![0.1, 0.2].into_dyn()), Tree::leaf(array![1.0, -1.0].into_dyn())]),
            )])])),
            (Key::from(-1), Tree::leaf(array![1.0, 1.0].into_dyn())),
        ])
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.bin");

        let tree = sample();
        save_data(&path, &tree).unwrap();
        let loaded: Tree<ArrayD<f64>> = load_data(&path).unwrap();
        assert_eq!(loaded, tree);
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.bin");

        save_data(&path, &sample()).unwrap();
        let small: Tree<ArrayD<f64>> = Tree::sequence([Tree::leaf(array![3.0].into_dyn())]);
        save_data(&path, &small).unwrap();
        assert_eq!(load_data::<ArrayD<f64>>(&path).unwrap(), small);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_data::<ArrayD<f64>>(dir.path().join("missing.bin"));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.bin");
        std::fs::write(&path, b"not a tree").unwrap();

        let result = load_data::<ArrayD<f64>>(&path);
        assert!(matches!(result, Err(Error::Serialization(_))));
    }
}
