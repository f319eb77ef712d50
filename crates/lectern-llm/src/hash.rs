//! FNV-1a feature-hashing embedder: offline, deterministic, no model download.

use crate::provider::{EmbedFn, EmbedFuture};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01B3;

pub const DEFAULT_DIMENSION: usize = 384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEmbedder {
    dimension: usize,
    ngram_range: (usize, usize),
}

impl HashEmbedder {
    /// # Panics
    ///
    /// Panics if `dimension` is zero.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        assert!(dimension > 0, "dimension must be > 0");
        Self {
            dimension,
            ngram_range: (3, 4),
        }
    }

    /// # Panics
    ///
    /// Panics unless `0 < min <= max`.
    #[must_use]
    pub fn with_ngram_range(mut self, min: usize, max: usize) -> Self {
        assert!(min > 0 && min <= max, "ngram range must satisfy 0 < min <= max");
        self.ngram_range = (min, max);
        self
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Embed `text` into an L2-normalized vector. Inputs shorter than the smallest
    /// n-gram map to the zero vector.
    #[must_use]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];
        let chars: Vec<char> = text.to_lowercase().chars().collect();
        for n in self.ngram_range.0..=self.ngram_range.1 {
            if n > chars.len() {
                continue;
            }
            for window in chars.windows(n) {
                let ngram: String = window.iter().collect();
                let h = fnv1a(ngram.as_bytes());
                #[expect(clippy::cast_possible_truncation)]
                let bucket = (h % self.dimension as u64) as usize;
                let sign = if (h >> 32) & 1 == 0 { 1.0f32 } else { -1.0f32 };
                vector[bucket] += sign;
            }
        }
        l2_normalize(&mut vector);
        vector
    }

    /// Boxed embedding function for the semantic index.
    #[must_use]
    pub fn embed_fn(&self) -> EmbedFn {
        let embedder = *self;
        Box::new(move |text: &str| -> EmbedFuture {
            let vector = embedder.embed(text);
            Box::pin(async move { Ok(vector) })
        })
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSION)
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
