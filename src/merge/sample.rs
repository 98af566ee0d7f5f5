use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Picks up to `size` items with a seeded generator, keeping their original order.
/// The same seed and input always give the same selection.
pub fn draw_sample<T: Clone>(items: &[T], size: usize, seed: u64) -> Vec<T> {
    if items.len() <= size {
        return items.to_vec();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = index::sample(&mut rng, items.len(), size).into_vec();
    picked.sort_unstable();
    picked.into_iter().map(|i| items[i].clone()).collect()
}

/// Seed for one source, so two sources with the same size still get different rows.
pub fn source_seed(seed: u64, source_name: &str) -> u64 {
    source_name
        .bytes()
        .fold(seed, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_rows() {
        let items: Vec<u32> = (0..1000).collect();
        let a = draw_sample(&items, 10, 42);
        let b = draw_sample(&items, 10, 42);
        assert_eq!(a, b);
        assert_eq!(a.len(), 10);
        assert!(a.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn small_inputs_are_returned_whole() {
        let items = vec!["a", "b", "c"];
        assert_eq!(draw_sample(&items, 10, 1), items);
        assert!(draw_sample::<u8>(&[], 10, 1).is_empty());
    }

    #[test]
    fn seeds_differ_per_source() {
        assert_ne!(source_seed(42, "intl"), source_seed(42, "cn"));
        assert_eq!(source_seed(42, "cn"), source_seed(42, "cn"));
    }
}
