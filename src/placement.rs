use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geometry::{Position, Size};

/// Uniform integer source used to place the target
pub trait RandomSource {
    /// Uniform draw in `[0, upper)`. An `upper` of 0 behaves like 1.
    fn next_in_range(&mut self, upper: u32) -> u32;
}

/// Adapts any `rand` generator
#[derive(Debug, Clone)]
pub struct RngSource<R: Rng> {
    rng: R,
}

impl<R: Rng> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> RandomSource for RngSource<R> {
    fn next_in_range(&mut self, upper: u32) -> u32 {
        self.rng.gen_range(0..upper.max(1))
    }
}

/// Draws a new top-left corner for the target.
///
/// Each axis is drawn over the whole viewport and then pinned to `viewport - target` when it
/// would overflow, so the far edge is favoured. A viewport narrower than the target pins to 0.
pub fn place_target<R: RandomSource + ?Sized>(
    rng: &mut R,
    viewport: Size,
    target: Size,
) -> Position {
    let viewport = viewport.sanitized();
    let max_x = viewport.width.saturating_sub(target.width);
    let max_y = viewport.height.saturating_sub(target.height);

    let mut x = rng.next_in_range(viewport.width);
    let mut y = rng.next_in_range(viewport.height);

    if x >= max_x {
        x = max_x;
    }
    if y >= max_y {
        y = max_y;
    }

    Position::new(x, y)
}

/// Pulls an existing position back inside a (possibly shrunk) viewport
pub fn clamp_into(position: Position, viewport: Size, target: Size) -> Position {
    let viewport = viewport.sanitized();
    Position::new(
        position.x.min(viewport.width.saturating_sub(target.width)),
        position.y.min(viewport.height.saturating_sub(target.height)),
    )
}
