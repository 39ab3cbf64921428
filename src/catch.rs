//! Catch game logic and the collection of caught Pokemon.
//!
//! The catch rate falls as base experience rises and is clamped to a
//! percentage, so very strong Pokemon simply can't be caught.

use std::collections::BTreeMap;

use rand::Rng;

use crate::data::Pokemon;

/// Catch rate for a Pokemon with zero base experience.
const BASE_CATCH_RATE: i64 = 90;

/// Base experience that costs one percentage point of catch rate.
const EXPERIENCE_PER_POINT: i64 = 10;

/// Returns the percentage chance (0-100) of catching a Pokemon.
///
/// `90 - base_experience / 10`, clamped to `[0, 100]`. Anything with 900 or
/// more base experience has a rate of 0.
pub fn catch_rate(base_experience: u32) -> u8 {
    let rate = BASE_CATCH_RATE - i64::from(base_experience) / EXPERIENCE_PER_POINT;
    rate.clamp(0, 100) as u8
}

/// Rolls for a catch with the given rate.
///
/// Draws uniformly from `0..100` and succeeds when the roll is below `rate`,
/// so a rate of 0 never catches and a rate of 100 always does.
pub fn roll_catch<R: Rng + ?Sized>(rate: u8, rng: &mut R) -> bool {
    rng.gen_range(0..100u8) < rate
}

/// Pokemon caught during this session, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct Pokedex {
    caught: BTreeMap<String, Pokemon>,
}

impl Pokedex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a caught Pokemon, replacing any previous entry with the same name.
    pub fn insert(&mut self, pokemon: Pokemon) {
        self.caught.insert(pokemon.name.clone(), pokemon);
    }

    pub fn get(&self, name: &str) -> Option<&Pokemon> {
        self.caught.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.caught.contains_key(name)
    }

    /// Names of all caught Pokemon in alphabetical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.caught.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.caught.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caught.is_empty()
    }
}
