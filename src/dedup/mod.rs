//! Probabilistic dedup filter for discovered URLs
//!
//! The tracker remembers every URL it has accepted in a Bloom filter. Memory
//! is fixed up front; a false positive means a link is dropped as "already
//! seen" when it was not, which under-counts the graph but never produces an
//! invalid one. There are no false negatives.

use sha2::{Digest, Sha256};

/// A Bloom filter over strings
///
/// Bit positions come from double hashing: two 64-bit values are taken from a
/// SHA-256 digest of the key and combined as `h1 + i * h2` for each of the `k`
/// hash functions.
#[derive(Debug, Clone)]
pub struct BloomFilter {
    bits: Vec<u64>,
    bit_count: u64,
    hash_count: u32,
    inserted: usize,
}

impl BloomFilter {
    /// Creates a filter with an explicit number of bits and hash functions
    ///
    /// Both values are clamped to at least 1.
    pub fn new(bit_count: u64, hash_count: u32) -> Self {
        let bit_count = bit_count.max(1);
        let words = bit_count.div_ceil(64) as usize;
        Self {
            bits: vec![0; words],
            bit_count,
            hash_count: hash_count.max(1),
            inserted: 0,
        }
    }

    /// Creates a filter sized for `expected_items` at the given false-positive rate
    ///
    /// # Arguments
    ///
    /// * `expected_items` - Number of distinct keys the filter should hold
    /// * `false_positive_rate` - Target probability in `(0, 1)`
    ///
    /// # Example
    ///
    /// ```
    /// use sitemap_crawler::dedup::BloomFilter;
    ///
    /// let mut filter = BloomFilter::with_rate(1_000, 0.01);
    /// assert!(!filter.check_and_insert("http://example.com/"));
    /// assert!(filter.check_and_insert("http://example.com/"));
    /// ```
    pub fn with_rate(expected_items: usize, false_positive_rate: f64) -> Self {
        let n = expected_items.max(1) as f64;
        let p = false_positive_rate.clamp(f64::MIN_POSITIVE, 0.5);
        let ln2 = std::f64::consts::LN_2;

        let m = (-(n * p.ln()) / (ln2 * ln2)).ceil();
        let k = ((m / n) * ln2).round();

        Self::new(m as u64, k as u32)
    }

    /// Returns true if the key was probably inserted before
    pub fn contains(&self, key: &str) -> bool {
        self.positions(key).all(|bit| self.get(bit))
    }

    /// Adds a key to the filter
    pub fn insert(&mut self, key: &str) {
        let positions: Vec<u64> = self.positions(key).collect();
        for bit in positions {
            self.set(bit);
        }
        self.inserted += 1;
    }

    /// Tests for the key and adds it in one pass
    ///
    /// Returns true if the key was (probably) already present, in which case
    /// nothing changes.
    pub fn check_and_insert(&mut self, key: &str) -> bool {
        let positions: Vec<u64> = self.positions(key).collect();
        if positions.iter().all(|&bit| self.get(bit)) {
            return true;
        }
        for bit in positions {
            self.set(bit);
        }
        self.inserted += 1;
        false
    }

    /// Number of keys inserted (each accepted insertion counts once)
    pub fn len(&self) -> usize {
        self.inserted
    }

    pub fn is_empty(&self) -> bool {
        self.inserted == 0
    }

    pub fn bit_count(&self) -> u64 {
        self.bit_count
    }

    pub fn hash_count(&self) -> u32 {
        self.hash_count
    }

    /// Expected false-positive probability at the current fill level
    pub fn estimated_false_positive_rate(&self) -> f64 {
        let k = self.hash_count as f64;
        let n = self.inserted as f64;
        let m = self.bit_count as f64;
        (1.0 - (-k * n / m).exp()).powf(k)
    }

    fn positions(&self, key: &str) -> impl Iterator<Item = u64> {
        let digest = Sha256::digest(key.as_bytes());
        let mut first = [0u8; 8];
        let mut second = [0u8; 8];
        first.copy_from_slice(&digest[0..8]);
        second.copy_from_slice(&digest[8..16]);

        let h1 = u64::from_le_bytes(first);
        // Odd step so successive positions never collapse onto one bit
        let h2 = u64::from_le_bytes(second) | 1;
        let m = self.bit_count;

        (0..self.hash_count as u64).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
    }

    fn get(&self, bit: u64) -> bool {
        let word = (bit / 64) as usize;
        self.bits[word] & (1u64 << (bit % 64)) != 0
    }

    fn set(&mut self, bit: u64) {
        let word = (bit / 64) as usize;
        self.bits[word] |= 1u64 << (bit % 64);
    }
}
