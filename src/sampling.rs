use rand::{rngs::SmallRng, Rng, SeedableRng};
use rand_distr::{Distribution, Uniform};

pub fn small_rng(seed: u64) -> SmallRng {
    SmallRng::seed_from_u64(seed)
}

/// Uniform sample from `[min, max]`. Collapses to `min` when the range is empty.
pub fn sample_inclusive<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }

    Uniform::new_inclusive(min, max).sample(rng)
}

/// Weight of the candidate at sorted rank `rank`.
pub fn rank_weight(rank: usize) -> f32 {
    1.0 / (rank as f32 + 1.0)
}

/// Cumulative-weight roulette: draws `u` in `[0, total)` and returns the first bucket whose
/// cumulative weight exceeds `u`. Falls back to a uniform pick when no weight is positive.
pub fn roulette_index<R: Rng + ?Sized>(weights: &[f32], rng: &mut R) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f32 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0, weights.len()));
    }

    let draw = rng.gen_range(0.0, total);
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        if *w <= 0.0 {
            continue;
        }
        cumulative += *w;
        if draw < cumulative {
            return Some(i);
        }
    }

    // Float rounding can leave `draw` just past the final sum.
    weights.iter().rposition(|w| *w > 0.0)
}

/// Removes and returns one element of `pool`, chosen proportionally to its weight.
pub fn take_weighted<T, R: Rng + ?Sized>(pool: &mut Vec<(T, f32)>, rng: &mut R) -> Option<T> {
    let weights: Vec<f32> = pool.iter().map(|(_, w)| *w).collect();
    let i = roulette_index(&weights, rng)?;

    Some(pool.remove(i).0)
}

/// Weighted sampling without replacement from an ordered list: the element at current rank
/// `r` has weight `1 / (r + 1)`. Ranks are recomputed after every removal.
pub fn take_by_rank<T, R: Rng + ?Sized>(mut sorted: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    let mut chosen = Vec::with_capacity(count.min(sorted.len()));
    while chosen.len() < count && !sorted.is_empty() {
        let weights: Vec<f32> = (0..sorted.len()).map(rank_weight).collect();
        match roulette_index(&weights, rng) {
            Some(i) => chosen.push(sorted.remove(i)),
            None => break,
        }
    }

    chosen
}
