//! Randomized checks of the tree against a brute-force scan.

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::kdtree::{Entry, KDTree};

/// Random keys on a small grid so that ties and exact duplicates are common.
fn random_pairs(
    rng: &mut StdRng,
    n: usize,
    dimension: usize,
    spread: i32,
) -> Vec<(Vec<i32>, usize)> {
    (0..n)
        .map(|i| {
            let key = (0..dimension).map(|_| rng.gen_range(0..spread)).collect();
            (key, i)
        })
        .collect()
}

fn random_bounds(rng: &mut StdRng, dimension: usize, spread: i32) -> Vec<(i32, i32)> {
    (0..dimension)
        .map(|_| {
            let a = rng.gen_range(-1..=spread);
            let b = rng.gen_range(-1..=spread);
            // mostly well-formed boxes, sometimes inverted ones
            if rng.gen_bool(0.9) {
                (a.min(b), a.max(b))
            } else {
                (a.max(b), a.min(b))
            }
        })
        .collect()
}

/// Distinct keys with the value of their last occurrence.
fn last_values(pairs: &[(Vec<i32>, usize)]) -> HashMap<Vec<i32>, usize> {
    let mut map = HashMap::new();
    for (key, value) in pairs {
        map.insert(key.clone(), *value);
    }
    map
}

fn in_box(key: &[i32], bounds: &[(i32, i32)]) -> bool {
    key.iter()
        .zip(bounds)
        .all(|(c, (min, max))| min <= c && c <= max)
}

fn check_query(
    tree: &KDTree<i32, usize>,
    expected: &HashMap<Vec<i32>, usize>,
    bounds: &[(i32, i32)],
) {
    let result: Vec<&Entry<i32, usize>> = tree.range(bounds).unwrap().collect();

    let mut seen = HashSet::new();
    for entry in &result {
        assert!(in_box(entry.key(), bounds), "{:?} outside {:?}", entry.key(), bounds);
        assert_eq!(Some(entry.value()), expected.get(entry.key()));
        assert!(
            seen.insert(entry.key().to_vec()),
            "{:?} returned twice",
            entry.key()
        );
    }

    let matching = expected.keys().filter(|key| in_box(key, bounds)).count();
    assert_eq!(result.len(), matching, "missing matches for {:?}", bounds);
}

#[test]
fn queries_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x6b64);
    for round in 0..40 {
        let dimension = 1 + round % 4;
        let spread = [3, 10, 100][round % 3];
        let n = rng.gen_range(1..400);
        let pairs = random_pairs(&mut rng, n, dimension, spread);
        let expected = last_values(&pairs);

        let tree = KDTree::try_new(pairs, dimension).unwrap();
        assert_eq!(tree.len(), expected.len());
        assert_eq!(tree.num_nodes(), 2 * expected.len() - 1);

        for _ in 0..25 {
            let bounds = random_bounds(&mut rng, dimension, spread);
            check_query(&tree, &expected, &bounds);
        }

        // completeness
        let everything = tree.range(&tree.full_range()).unwrap().count();
        assert_eq!(everything, expected.len());
    }
}

#[test]
fn every_stored_key_is_found() {
    let mut rng = StdRng::seed_from_u64(7);
    let pairs = random_pairs(&mut rng, 1000, 3, 12);
    let expected = last_values(&pairs);
    let tree = KDTree::try_new(pairs, 3).unwrap();

    for (key, value) in &expected {
        assert_eq!(tree.get(key).unwrap(), Some(value));
    }
    assert_eq!(tree.get(&[12, 12, 12]).unwrap(), None);
}

#[test]
fn queries_preserve_iteration_order() {
    let mut rng = StdRng::seed_from_u64(99);
    let pairs = random_pairs(&mut rng, 500, 2, 50);
    let tree = KDTree::try_new(pairs, 2).unwrap();
    let rank: HashMap<*const Entry<i32, usize>, usize> = tree
        .iter()
        .enumerate()
        .map(|(i, e)| (e as *const _, i))
        .collect();

    for _ in 0..50 {
        let bounds = random_bounds(&mut rng, 2, 50);
        let ranks: Vec<usize> = tree
            .range(&bounds)
            .unwrap()
            .map(|e| rank[&(e as *const _)])
            .collect();
        assert!(ranks.windows(2).all(|w| w[0] < w[1]));
    }
}

#[test]
fn sub_selection_rebuilds_same_entries() {
    let mut rng = StdRng::seed_from_u64(1234);
    for _ in 0..10 {
        let pairs = random_pairs(&mut rng, 300, 3, 20);
        let tree = KDTree::try_new(pairs, 3).unwrap();
        let bounds = random_bounds(&mut rng, 3, 20);

        let mut selected: Vec<(Vec<i32>, usize)> =
            tree.range(&bounds).unwrap().map(Entry::to_pair).collect();
        let sub_tree = KDTree::try_new(selected.clone(), 3).unwrap();
        let mut rebuilt: Vec<(Vec<i32>, usize)> = sub_tree
            .range(&sub_tree.full_range())
            .unwrap()
            .map(Entry::to_pair)
            .collect();

        selected.sort();
        rebuilt.sort();
        assert_eq!(selected, rebuilt);
    }
}

#[test]
fn large_build_uses_sampled_selection() {
    // Enough items for the Floyd-Rivest sampling branch to kick in
    let mut rng = StdRng::seed_from_u64(42);
    let pairs = random_pairs(&mut rng, 5000, 2, 1000);
    let expected = last_values(&pairs);
    let tree = KDTree::try_new(pairs, 2).unwrap();
    assert_eq!(tree.len(), expected.len());

    for _ in 0..20 {
        let bounds = random_bounds(&mut rng, 2, 1000);
        check_query(&tree, &expected, &bounds);
    }
}
