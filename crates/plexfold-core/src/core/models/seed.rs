use rand::{Rng, thread_rng};
use thiserror::Error;

/// Integer identifier controlling stochastic initialization of one inference run.
pub type Seed = u64;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum SeedError {
    #[error("Seed {seed} appears more than once in the explicit seed list")]
    Duplicate { seed: Seed },

    #[error("At least one seed is required")]
    Empty,
}

/// How the seed set for a job is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedPlan {
    /// Use exactly these seeds, in order.
    Explicit(Vec<Seed>),
    /// Generate this many distinct seeds.
    Generate(usize),
}

impl SeedPlan {
    /// Resolves the plan into an ordered set of unique seeds.
    ///
    /// Explicit lists keep their order and reject duplicates; generated sets
    /// draw from the thread RNG and redraw on collision, so the result is
    /// unique but not reproducible across runs.
    pub fn resolve(&self) -> Result<Vec<Seed>, SeedError> {
        match self {
            SeedPlan::Explicit(seeds) => {
                if seeds.is_empty() {
                    return Err(SeedError::Empty);
                }
                for (i, seed) in seeds.iter().enumerate() {
                    if seeds[..i].contains(seed) {
                        return Err(SeedError::Duplicate { seed: *seed });
                    }
                }
                Ok(seeds.clone())
            }
            SeedPlan::Generate(0) => Err(SeedError::Empty),
            SeedPlan::Generate(count) => {
                let mut rng = thread_rng();
                let mut seeds: Vec<Seed> = Vec::with_capacity(*count);
                while seeds.len() < *count {
                    let candidate = rng.gen_range(0..u32::MAX as u64);
                    if !seeds.contains(&candidate) {
                        seeds.push(candidate);
                    }
                }
                Ok(seeds)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_seeds_keep_their_order() {
        let plan = SeedPlan::Explicit(vec![7, 3, 11]);
        assert_eq!(plan.resolve().unwrap(), vec![7, 3, 11]);
    }

    #[test]
    fn duplicate_explicit_seed_is_rejected() {
        let plan = SeedPlan::Explicit(vec![1, 2, 1]);
        assert_eq!(plan.resolve().unwrap_err(), SeedError::Duplicate { seed: 1 });
    }

    #[test]
    fn empty_plans_are_rejected() {
        assert_eq!(
            SeedPlan::Explicit(vec![]).resolve().unwrap_err(),
            SeedError::Empty
        );
        assert_eq!(SeedPlan::Generate(0).resolve().unwrap_err(), SeedError::Empty);
    }

    #[test]
    fn generated_seeds_are_unique() {
        let seeds = SeedPlan::Generate(16).resolve().unwrap();
        assert_eq!(seeds.len(), 16);
        for (i, seed) in seeds.iter().enumerate() {
            assert!(!seeds[..i].contains(seed));
        }
    }
}
