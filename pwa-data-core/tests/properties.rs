use ndarray::ArrayD;
use proptest::prelude::*;

use pwa_data_core::{data_map, data_merge, data_shape_all, data_split, Result, Tree};

type Data = Tree<ArrayD<f64>>;

fn leaf(rows: usize) -> impl Strategy<Value = Data> {
    (1usize..4).prop_flat_map(move |width| {
        prop::collection::vec(-1.0e3f64..1.0e3, rows * width)
            .prop_map(move |values| Tree::leaf(ArrayD::from_shape_vec(vec![rows, width], values).unwrap()))
    })
}

/// Trees of mappings, sequences and tuples whose leaves all have `rows` rows
fn tree(rows: usize) -> impl Strategy<Value = Data> {
    leaf(rows).prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(("[a-z]{1,3}", inner.clone()), 1..4).prop_map(Tree::mapping),
            prop::collection::vec(inner.clone(), 1..4).prop_map(Tree::Sequence),
            prop::collection::vec(inner, 1..4).prop_map(Tree::Tuple),
        ]
    })
}

fn tree_and_batch() -> impl Strategy<Value = (Data, usize)> {
    (1usize..9).prop_flat_map(|rows| (tree(rows), 1..=rows))
}

fn split_all(tree: &Data, batch_size: usize) -> Result<Vec<Data>> {
    data_split(tree, batch_size, 0)?.collect()
}

proptest! {
    #[test]
    fn map_identity(t in tree(3)) {
        prop_assert_eq!(data_map(&t, |x| x.clone()), t);
    }

    #[test]
    fn map_composition(t in tree(2)) {
        let f = |x: &ArrayD<f64>| x.mapv(|v| v * 2.0);
        let g = |x: &ArrayD<f64>| x.mapv(|v| v - 1.0);

        let chained = data_map(&data_map(&t, f), g);
        let fused = data_map(&t, |x| g(&f(x)));
        prop_assert_eq!(chained, fused);
    }

    #[test]
    fn split_merge_round_trip((t, batch_size) in tree_and_batch()) {
        let batches = split_all(&t, batch_size).unwrap();
        let rows = data_shape_all(&t)[0][0];
        prop_assert_eq!(batches.len(), (rows + batch_size - 1) / batch_size);

        let merged = data_merge(&batches, 0).unwrap();
        prop_assert_eq!(merged, t);
    }

    #[test]
    fn map_commutes_with_split_and_merge((t, batch_size) in tree_and_batch()) {
        let f = |x: &ArrayD<f64>| x.mapv(|v| v.abs());

        let batches = split_all(&t, batch_size).unwrap();
        let mapped: Vec<Data> = batches.iter().map(|b| data_map(b, f)).collect();
        let merged = data_merge(&mapped, 0).unwrap();

        prop_assert_eq!(merged, data_map(&t, f));
    }

    #[test]
    fn every_batch_keeps_structure((t, batch_size) in tree_and_batch()) {
        let leaf_count = t.leaves().count();
        for batch in split_all(&t, batch_size).unwrap() {
            prop_assert_eq!(batch.leaves().count(), leaf_count);
            prop_assert_eq!(batch.kind(), t.kind());
            prop_assert_eq!(batch.len(), t.len());
        }
    }
}
