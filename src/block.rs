use crate::params::BLOCK_SIZE;

use zeroize::Zeroize;

/// Number of 64-bit words in a block.
pub(crate) const QWORDS_IN_BLOCK: usize = BLOCK_SIZE / 8;

const LOW_32_BITS: u64 = 0xffff_ffff;

/// A 1 KiB memory block, stored as little-endian 64-bit words.
#[derive(Clone)]
#[repr(C, align(64))]
pub(crate) struct Block([u64; QWORDS_IN_BLOCK]);

impl Block {
    pub(crate) const ZERO: Block = Block([0; QWORDS_IN_BLOCK]);

    pub(crate) fn word(&self, index: usize) -> u64 {
        self.0[index]
    }

    pub(crate) fn set_word(&mut self, index: usize, value: u64) {
        self.0[index] = value;
    }

    pub(crate) fn load(&mut self, bytes: &[u8; BLOCK_SIZE]) {
        for (word, chunk) in self.0.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut le = [0u8; 8];
            le.copy_from_slice(chunk);
            *word = u64::from_le_bytes(le);
        }
    }

    pub(crate) fn store(&self, bytes: &mut [u8; BLOCK_SIZE]) {
        for (word, chunk) in self.0.iter().zip(bytes.chunks_exact_mut(8)) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
    }

    pub(crate) fn copy_from(&mut self, other: &Block) {
        self.0.copy_from_slice(&other.0);
    }

    pub(crate) fn xor_with(&mut self, other: &Block) {
        for (dst, src) in self.0.iter_mut().zip(other.0.iter()) {
            *dst ^= src;
        }
    }

    /// The compression function `G`.
    ///
    /// Computes `R = prev ^ reference`, runs the BlaMka permutation over the eight rows and
    /// then the eight columns of `R` and stores `P(R) ^ R` in `next`. With `with_xor` the
    /// result is XORed into the existing contents of `next` instead (passes after the first).
    ///
    /// The sequence of operations and memory accesses is the same for every input.
    pub(crate) fn compress(prev: &Block, reference: &Block, next: &mut Block, with_xor: bool) {
        let mut r = Block::ZERO;
        for (dst, (a, b)) in r.0.iter_mut().zip(prev.0.iter().zip(reference.0.iter())) {
            *dst = a ^ b;
        }

        let mut q = r.clone();

        for row in 0..8 {
            let words = &mut q.0[16 * row..16 * row + 16];
            let mut v = [0u64; 16];
            v.copy_from_slice(words);
            permute(&mut v);
            words.copy_from_slice(&v);
        }

        for column in 0..8 {
            let mut v = [0u64; 16];
            for j in 0..8 {
                v[2 * j] = q.0[2 * column + 16 * j];
                v[2 * j + 1] = q.0[2 * column + 16 * j + 1];
            }
            permute(&mut v);
            for j in 0..8 {
                q.0[2 * column + 16 * j] = v[2 * j];
                q.0[2 * column + 16 * j + 1] = v[2 * j + 1];
            }
        }

        if with_xor {
            for (dst, (a, b)) in next.0.iter_mut().zip(q.0.iter().zip(r.0.iter())) {
                *dst ^= a ^ b;
            }
        } else {
            for (dst, (a, b)) in next.0.iter_mut().zip(q.0.iter().zip(r.0.iter())) {
                *dst = a ^ b;
            }
        }

        r.zeroize();
        q.zeroize();
    }
}

impl Default for Block {
    fn default() -> Self {
        Block::ZERO
    }
}

impl Zeroize for Block {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// BLAKE2b addition hardened with a 32x32 bit multiplication.
#[inline(always)]
fn blamka(x: u64, y: u64) -> u64 {
    let product = (x & LOW_32_BITS).wrapping_mul(y & LOW_32_BITS);
    x.wrapping_add(y).wrapping_add(product.wrapping_mul(2))
}

#[inline(always)]
fn mix(v: &mut [u64; 16], a: usize, b: usize, c: usize, d: usize) {
    v[a] = blamka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(32);
    v[c] = blamka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(24);
    v[a] = blamka(v[a], v[b]);
    v[d] = (v[d] ^ v[a]).rotate_right(16);
    v[c] = blamka(v[c], v[d]);
    v[b] = (v[b] ^ v[c]).rotate_right(63);
}

/// One BLAKE2b round over a 4x4 matrix of words: columns, then diagonals.
#[inline(always)]
fn permute(v: &mut [u64; 16]) {
    mix(v, 0, 4, 8, 12);
    mix(v, 1, 5, 9, 13);
    mix(v, 2, 6, 10, 14);
    mix(v, 3, 7, 11, 15);

    mix(v, 0, 5, 10, 15);
    mix(v, 1, 6, 11, 12);
    mix(v, 2, 7, 8, 13);
    mix(v, 3, 4, 9, 14);
}
