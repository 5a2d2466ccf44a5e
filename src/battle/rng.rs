use log::trace;
use rand::Rng;

/// Randomness consumed by the engine. Every draw names its reason so scripted
/// test sequences and replay logs can be lined up with the rules that used them.
pub trait BattleRng {
    /// Uniform integer in `[0, bound)`. `bound` must be non-zero.
    fn next_int(&mut self, bound: u32, reason: &str) -> u32;

    /// Uniform integer in `[min, max]`.
    fn next_range(&mut self, min: u32, max: u32, reason: &str) -> u32 {
        if max <= min {
            return min;
        }
        min + self.next_int(max - min + 1, reason)
    }

    /// Percentage roll. Certain and impossible outcomes do not draw.
    fn chance(&mut self, percent: u8, reason: &str) -> bool {
        match percent {
            0 => false,
            100..=u8::MAX => true,
            _ => self.next_int(100, reason) < percent as u32,
        }
    }

    /// Standard normal sample via Box-Muller over two integer draws.
    fn next_gaussian(&mut self, reason: &str) -> f64 {
        const STEPS: u32 = 10_000;
        let u1 = (self.next_int(STEPS, reason) as f64 + 1.0) / (STEPS as f64 + 1.0);
        let u2 = self.next_int(STEPS, reason) as f64 / STEPS as f64;
        (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
    }
}

/// Fisher-Yates shuffle driven by the battle generator.
pub fn shuffle<T>(rng: &mut dyn BattleRng, items: &mut [T], reason: &str) {
    if items.len() < 2 {
        return;
    }
    for start in 0..items.len() - 1 {
        let remaining = (items.len() - start) as u32;
        let next = start + rng.next_int(remaining, reason) as usize;
        items.swap(start, next);
    }
}

/// Random element of a slice, drawing only when there is a real choice.
pub fn sample<'a, T>(rng: &mut dyn BattleRng, items: &'a [T], reason: &str) -> Option<&'a T> {
    match items.len() {
        0 => None,
        1 => items.first(),
        len => items.get(rng.next_int(len as u32, reason) as usize),
    }
}

/// Seeded linear congruential generator. Two generators created with the same
/// seed produce the same sequence, which makes whole battles replayable.
#[derive(Debug, Clone)]
pub struct SeededRng {
    initial_seed: u64,
    seed: u64,
}

impl SeededRng {
    pub fn new(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(Self::generate_seed);
        Self {
            initial_seed: seed,
            seed,
        }
    }

    fn generate_seed() -> u64 {
        let mut rng = rand::rng();
        rng.random()
    }

    /// Seed to hand back to `new` to replay this battle.
    pub fn initial_seed(&self) -> u64 {
        self.initial_seed
    }

    fn next_seed(seed: u64) -> u64 {
        const A: u64 = 0x5D588B656C078965;
        const C: u64 = 0x0000000000269EC3;
        seed.wrapping_mul(A).wrapping_add(C)
    }

    fn next_u32(&mut self) -> u32 {
        self.seed = Self::next_seed(self.seed);
        // Upper half; the low bits of an LCG cycle quickly.
        (self.seed >> 32) as u32
    }
}

impl BattleRng for SeededRng {
    fn next_int(&mut self, bound: u32, reason: &str) -> u32 {
        let bound = bound.max(1);
        let value = ((self.next_u32() as u64 * bound as u64) >> 32) as u32;
        trace!("[RNG] {} of {} for: {}", value, bound, reason);
        value
    }
}

/// Scripted generator for tests. Each outcome is clamped to `bound - 1`.
pub struct TurnRng {
    outcomes: Vec<u8>,
    index: usize,
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        Self { outcomes, index: 0 }
    }

    /// Number of outcomes consumed so far.
    pub fn consumed(&self) -> usize {
        self.index
    }

    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        if self.index >= self.outcomes.len() {
            // Add the reason to the panic message for better debugging!
            panic!(
                "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let outcome = self.outcomes[self.index];

        trace!("[RNG] Consumed {} for: {}", outcome, reason);

        self.index += 1;
        outcome
    }
}

impl BattleRng for TurnRng {
    fn next_int(&mut self, bound: u32, reason: &str) -> u32 {
        let outcome = self.next_outcome(reason) as u32;
        outcome.min(bound.max(1) - 1)
    }
}
