//! The variable-length hash `H'` built on BLAKE2b.

use crate::error::Argon2Error;

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use zeroize::{Zeroize, Zeroizing};

const BLAKE2B_OUTBYTES: usize = 64;
const HALF_OUTBYTES: usize = BLAKE2B_OUTBYTES / 2;

/// Deeper than any BLAKE2b call chain made by this crate, hasher state included.
const STACK_SCRUB_BYTES: usize = 16 * 1024;

/// Fills `out` with `H'(out.len(), inputs...)`.
///
/// Up to 64 bytes this is a single BLAKE2b call over `LE32(out.len()) || inputs`. Longer
/// outputs chain 64-byte BLAKE2b digests, keeping the first half of each, and finish with a
/// digest sized to whatever is left.
pub(crate) fn blake2b_long(out: &mut [u8], inputs: &[&[u8]]) -> Result<(), Argon2Error> {
    let out_len = u32::try_from(out.len()).map_err(|_| Argon2Error::InvalidOutputLength)?;

    if out.len() <= BLAKE2B_OUTBYTES {
        let mut hasher = new_hasher(out.len())?;
        hasher.update(&out_len.to_le_bytes());
        for input in inputs {
            hasher.update(input);
        }
        return finish(hasher, out);
    }

    let mut digest = Zeroizing::new([0u8; BLAKE2B_OUTBYTES]);

    let mut hasher = new_hasher(BLAKE2B_OUTBYTES)?;
    hasher.update(&out_len.to_le_bytes());
    for input in inputs {
        hasher.update(input);
    }
    finish(hasher, &mut digest[..])?;

    let mut written = 0;
    loop {
        let end = written + HALF_OUTBYTES;
        out[written..end].copy_from_slice(&digest[..HALF_OUTBYTES]);
        written = end;

        if out.len() - written <= BLAKE2B_OUTBYTES {
            break;
        }

        let mut hasher = new_hasher(BLAKE2B_OUTBYTES)?;
        hasher.update(&digest[..]);
        finish(hasher, &mut digest[..])?;
    }

    let mut hasher = new_hasher(out.len() - written)?;
    hasher.update(&digest[..]);
    finish(hasher, &mut out[written..])
}

/// Overwrites the stack just below the caller's frame with zeros.
///
/// `Blake2bVar` keeps its block buffer and chaining value inline and offers no way to wipe
/// them, and the compression function copies message words into locals. Calling this right
/// after a hashing call returns lays a zeroed frame over everything that call left behind.
#[inline(never)]
pub(crate) fn scrub_stack() {
    let mut scratch = [0u8; STACK_SCRUB_BYTES];
    scratch.zeroize();
    std::hint::black_box(&scratch);
}

fn new_hasher(len: usize) -> Result<Blake2bVar, Argon2Error> {
    Blake2bVar::new(len).map_err(|_| Argon2Error::InvalidOutputLength)
}

fn finish(hasher: Blake2bVar, out: &mut [u8]) -> Result<(), Argon2Error> {
    hasher
        .finalize_variable(out)
        .map_err(|_| Argon2Error::InvalidOutputLength)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h_prime(len: usize, input: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; len];
        blake2b_long(&mut out, &[input]).unwrap();
        out
    }

    #[test]
    fn test_short_output() {
        assert_eq!(h_prime(4, b"abc"), [0x3e, 0x6c, 0x02, 0xac]);
    }

    #[test]
    fn test_full_digest_output() {
        let expected = "f32577a3172f56657d531faaa43077bb8c9726ada7bb04dd337ec5a65454abff\
                        241ad6b87a72440e5127c6f9caa70327f2a699096e52d163eb52d9cd99620593";
        assert_eq!(hex::encode(&h_prime(64, b"abc")), expected);
    }

    #[test]
    fn test_chained_output() {
        let expected = "4c9ba23bcafae5e571a5d41673bb8084a4a1de2688416ed390f669d33d364f3d\
                        4d9bfa7fe762680c6b2362711c4ce5b2c60ddcd14c1277ec1369c79f44c28966\
                        98a2b0773a3ce2e410532fa7c72f0bb61ccca0c24c362f337555cbf2998f2d36\
                        01be70d1";
        assert_eq!(hex::encode(&h_prime(100, b"abc")), expected);
    }

    #[test]
    fn test_block_sized_output() {
        let out = h_prime(1024, b"abc");
        assert_eq!(hex::encode(&out[..16]), "4038a0ea5c85fa5a0ea62fd668347bd4");
        assert_eq!(
            hex::encode(&out[1008..]),
            "fbfdc50ba0194abc940ec7cdc9fff8a0"
        );
    }

    #[test]
    fn test_split_inputs_match_concatenated_input() {
        let mut split = [0u8; 72];
        let inputs: [&[u8]; 2] = [b"pass", b"word"];
        blake2b_long(&mut split, &inputs).unwrap();
        assert_eq!(split.to_vec(), h_prime(72, b"password"));
    }
}
