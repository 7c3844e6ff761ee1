// Minimal PRNG plus the injectable randomness seam used by the network.
//
// This is NOT cryptographically secure.
// It is used only for wiring, polarity draws and growth, and must be
// reproducible under a fixed seed.

/// Source of uniform randomness for every stochastic decision in a network.
///
/// Implementations must be deterministic for a given initial state so that
/// two networks built from identical sources are bit-identical.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&mut self) -> f64;

    /// Uniform integer in `[low, high)`; returns `low` for an empty range.
    fn gen_range_usize(&mut self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        let span = (high - low) as f64;
        let v = (self.next_f64() * span) as usize;
        low + v.min(high - low - 1)
    }

    /// In-place Fisher-Yates shuffle.
    fn shuffle_indices(&mut self, items: &mut [usize]) {
        for i in (1..items.len()).rev() {
            let j = self.gen_range_usize(0, i + 1);
            items.swap(i, j);
        }
    }
}

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    #[inline]
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }
}

impl RandomSource for Prng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        // Top 53 bits -> [0,1).
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// Replays a fixed sequence of draws, wrapping around at the end.
///
/// Useful when a test wants to hand-compute which links end up active.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<f64>,
    cursor: usize,
}

impl ScriptedSource {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }
}

impl RandomSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
