use burn::data::dataset::{Dataset, InMemDataset};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// The AG News dataset
pub mod ag_news;

/// Shuffle a dataset with a seeded generator and split it into two parts,
/// the first holding `ratio` of the items (rounded down)
pub fn random_split<I, D>(dataset: D, ratio: f64, seed: u64) -> (InMemDataset<I>, InMemDataset<I>)
where
    I: Clone + Send + Sync,
    D: Dataset<I>,
{
    let mut items: Vec<I> = dataset.iter().collect();

    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let count = (items.len() as f64 * ratio) as usize;
    let rest = items.split_off(count.min(items.len()));

    (InMemDataset::new(items), InMemDataset::new(rest))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn splits_by_ratio() {
        let dataset = InMemDataset::new((0..20i64).collect::<Vec<_>>());

        let (train, valid) = random_split(dataset, 0.95, 42);

        assert_eq!(train.len(), 19);
        assert_eq!(valid.len(), 1);
    }

    #[test]
    fn keeps_every_item_exactly_once() {
        let dataset = InMemDataset::new((0..10i64).collect::<Vec<_>>());

        let (train, valid) = random_split(dataset, 0.5, 7);

        let mut all: Vec<i64> = train.iter().chain(valid.iter()).collect();
        all.sort_unstable();

        assert_eq!(all, (0..10).collect::<Vec<_>>());
    }
}
