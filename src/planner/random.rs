use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of randomness for plan generation and rerolls.
///
/// Kept object-safe so callers can pass `&mut dyn RandomSource`.
pub trait RandomSource {
    /// Uniform index in `0..upper`. Callers never pass `upper == 0`.
    fn pick(&mut self, upper: usize) -> usize;

    /// A uniform permutation of `0..len` (Fisher-Yates over `pick`).
    fn permutation(&mut self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        for i in (1..len).rev() {
            let j = self.pick(i + 1);
            order.swap(i, j);
        }
        order
    }
}

/// Adapts any `rand::Rng` into a `RandomSource`.
pub struct RngSource<R: Rng>(R);

impl RngSource<StdRng> {
    pub fn from_entropy() -> Self {
        RngSource(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        RngSource(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn pick(&mut self, upper: usize) -> usize {
        self.0.gen_range(0..upper)
    }
}

/// Keeps catalog order and always picks the first element.
#[derive(Debug, Default, Clone, Copy)]
pub struct InOrder;

impl RandomSource for InOrder {
    fn pick(&mut self, _upper: usize) -> usize {
        0
    }

    fn permutation(&mut self, len: usize) -> Vec<usize> {
        (0..len).collect()
    }
}

/// Reorders `items` according to `random.permutation`.
pub fn shuffle<T>(items: Vec<T>, random: &mut dyn RandomSource) -> Vec<T> {
    let order = random.permutation(items.len());
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();
    order.into_iter().filter_map(|index| slots[index].take()).collect()
}
