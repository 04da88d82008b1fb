#![allow(dead_code)]

use feynsum::{Expr, Field, Product};
use rand::{seq::SliceRandom, SeedableRng};
use rand_xoshiro::Xoroshiro64Star;

pub fn test_initialize() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// The items in a reproducible random order.
pub fn shuffled<T: Clone>(items: &[T], seed: u64) -> Vec<T> {
    let mut rng = Xoroshiro64Star::seed_from_u64(seed);
    let mut items = items.to_vec();
    items.shuffle(&mut rng);
    items
}

pub fn product_of(fields: Vec<Field>) -> Product {
    Product::new(fields.into_iter().map(Expr::Field))
}

/// `(n - 1)!!` for even `n`.
pub fn double_factorial(n: usize) -> usize {
    (1..n).step_by(2).product()
}
