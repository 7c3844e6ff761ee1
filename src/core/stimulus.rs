//! Stimulus feeds for the input layer.
//!
//! A feed hands out one flat input vector per call. Matrix-shaped samples
//! (images) are average-pooled with [`reduce_matrix`] and flattened
//! row-major before they reach a network.

use crate::error::{NetworkError, Result};
use crate::prng::Prng;

pub trait StimulusSource {
    fn next_data(&mut self) -> Vec<f64>;
}

/// Cycles through an in-memory sample set.
#[derive(Debug, Clone)]
pub struct CyclicSamples {
    samples: Vec<Vec<f64>>,
    counter: usize,
}

impl CyclicSamples {
    pub fn new(samples: Vec<Vec<f64>>) -> Result<Self> {
        if samples.is_empty() {
            return Err(NetworkError::EmptySamples);
        }
        Ok(Self {
            samples,
            counter: 0,
        })
    }

    /// Current sample without advancing.
    pub fn peek(&self) -> &[f64] {
        &self.samples[self.counter % self.samples.len()]
    }

    /// Never 0; construction rejects an empty set.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl StimulusSource for CyclicSamples {
    fn next_data(&mut self) -> Vec<f64> {
        let sample = self.samples[self.counter % self.samples.len()].clone();
        self.counter = self.counter.wrapping_add(1);
        sample
    }
}

/// Uniform noise in `[low, high)` on every input, seeded.
#[derive(Debug, Clone)]
pub struct NoiseStimulus {
    rng: Prng,
    width: usize,
    low: f64,
    high: f64,
}

impl NoiseStimulus {
    pub fn new(width: usize, low: f64, high: f64, seed: u64) -> Self {
        Self {
            rng: Prng::new(seed),
            width,
            low,
            high,
        }
    }
}

impl StimulusSource for NoiseStimulus {
    fn next_data(&mut self) -> Vec<f64> {
        (0..self.width)
            .map(|_| self.rng.gen_range_f64(self.low, self.high))
            .collect()
    }
}

/// Average-pool a square matrix by `factor` in both dimensions.
pub fn reduce_matrix(matrix: &[Vec<f64>], factor: usize) -> Result<Vec<Vec<f64>>> {
    let size = matrix.len();
    if let Some(row) = matrix.iter().find(|r| r.len() != size) {
        return Err(NetworkError::NotSquare {
            rows: size,
            cols: row.len(),
        });
    }
    if factor == 0 || size % factor != 0 {
        return Err(NetworkError::NotDivisible { size, factor });
    }

    let out = size / factor;
    let cell = (factor * factor) as f64;
    let mut result = vec![vec![0.0; out]; out];
    for (i, row) in result.iter_mut().enumerate() {
        for (j, v) in row.iter_mut().enumerate() {
            let mut sum = 0.0;
            for k in 0..factor {
                for l in 0..factor {
                    sum += matrix[i * factor + k][j * factor + l];
                }
            }
            *v = sum / cell;
        }
    }
    Ok(result)
}

pub fn flatten(matrix: &[Vec<f64>]) -> Vec<f64> {
    matrix.iter().flatten().copied().collect()
}
