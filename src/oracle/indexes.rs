//! Deterministic index draws
//!
//! ```text
//! index = u64_le(SHA256(seed || nonce)[0..8]) % range
//! ```
//!
//! The nonce is shared by every draw (oracle assignment and status requests)
//! and only advances when a draw is committed, so a rejected call never
//! perturbs later draws. Reproducible, not unpredictable.

use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct IndexDrawer {
    range: u8,
    nonce: u64,
}

impl IndexDrawer {
    pub fn new(range: u8) -> Self {
        Self { range, nonce: 0 }
    }

    pub fn range(&self) -> u8 {
        self.range
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    fn index_at(&self, seed: &[u8], nonce: u64) -> u8 {
        let mut hasher = Sha256::new();
        hasher.update(seed);
        hasher.update(nonce.to_le_bytes());
        let digest = hasher.finalize();

        let mut head = [0u8; 8];
        head.copy_from_slice(&digest[..8]);
        (u64::from_le_bytes(head) % u64::from(self.range)) as u8
    }

    /// Index the next committed draw for `seed` would return
    pub fn peek(&self, seed: &[u8]) -> u8 {
        self.index_at(seed, self.nonce)
    }

    /// Draw one index and advance the nonce
    pub fn draw(&mut self, seed: &[u8]) -> u8 {
        let index = self.peek(seed);
        self.nonce = self.nonce.wrapping_add(1);
        index
    }

    /// Draw until `count` distinct indexes are collected, in draw order.
    /// `count` must not exceed the range.
    pub fn draw_distinct(&mut self, seed: &[u8], count: usize) -> Vec<u8> {
        let count = count.min(self.range as usize);
        let mut indexes = Vec::with_capacity(count);
        while indexes.len() < count {
            let index = self.draw(seed);
            if !indexes.contains(&index) {
                indexes.push(index);
            }
        }
        indexes
    }
}
