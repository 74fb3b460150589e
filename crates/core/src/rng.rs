//! RNG module - seeded piece generation
//!
//! Each piece kind is drawn uniformly at random. The generator always holds
//! the already-announced next kind so the preview panel and the next spawn
//! agree.
//!
//! The LCG is deterministic so a seed replays the same game, which the tests
//! rely on.

use crate::types::PieceKind;

/// Simple LCG (Linear Congruential Generator) RNG
/// Uses constants from Numerical Recipes
#[derive(Debug, Clone)]
pub struct SimpleRng {
    state: u32,
}

impl SimpleRng {
    /// Create a new RNG with the given seed
    pub fn new(seed: u32) -> Self {
        // Avoid 0 seed which would produce all zeros
        let state = if seed == 0 { 1 } else { seed };
        Self { state }
    }

    /// Generate next random u32
    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1664525).wrapping_add(1013904223);
        self.state
    }

    /// Generate random value in range [0, max)
    ///
    /// Uses the high half of the state; the low bits of a power-of-two LCG
    /// cycle with very short periods.
    pub fn next_range(&mut self, max: u32) -> u32 {
        (self.next_u32() >> 16) % max.max(1)
    }
}

/// Uniform piece source with a one-piece lookahead
#[derive(Debug, Clone)]
pub struct PieceGenerator {
    rng: SimpleRng,
    seed: u32,
    next: PieceKind,
}

impl PieceGenerator {
    pub fn new(seed: u32) -> Self {
        let mut rng = SimpleRng::new(seed);
        let next = Self::roll(&mut rng);
        Self { rng, seed, next }
    }

    /// Generator whose first spawn is `next`; later kinds follow `seed`.
    pub fn with_next(seed: u32, next: PieceKind) -> Self {
        Self {
            rng: SimpleRng::new(seed),
            seed,
            next,
        }
    }

    fn roll(rng: &mut SimpleRng) -> PieceKind {
        PieceKind::ALL[rng.next_range(PieceKind::ALL.len() as u32) as usize]
    }

    /// The announced next kind
    pub fn peek(&self) -> PieceKind {
        self.next
    }

    /// Take the announced kind and announce a fresh one
    pub fn draw(&mut self) -> PieceKind {
        let kind = self.next;
        self.next = Self::roll(&mut self.rng);
        kind
    }

    /// Seed this generator was created with
    pub fn seed(&self) -> u32 {
        self.seed
    }
}

impl Default for PieceGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
