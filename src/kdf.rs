use crate::arena::Arena;
use crate::blake2b_long::{blake2b_long, scrub_stack};
use crate::block::Block;
use crate::error::Argon2Error;
use crate::params::{Algorithm, Geometry, Inputs, Params, BLOCK_SIZE, VERSION};
use crate::schedule::fill_memory;

use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;
use rayon::ThreadPool;
use zeroize::Zeroizing;

const PREHASH_DIGEST_LENGTH: usize = 64;
const PREHASH_SEED_LENGTH: usize = PREHASH_DIGEST_LENGTH + 8;

/// Derives an Argon2d tag of `output_length` bytes.
///
/// This is the whole derivation in one call: the parameters are validated before any memory is
/// reserved, the arena is wiped and freed before returning, and any failure is reported as an
/// error rather than as a zeroed tag.
///
/// ```rust
/// let tag = argon2_native::derive(2, 64, 1, 32, b"password", b"somesalt").unwrap();
/// assert_eq!(tag.len(), 32);
/// ```
pub fn derive(
    time_cost: u32,
    memory_cost_kib: u32,
    parallelism: u32,
    output_length: u32,
    password: &[u8],
    salt: &[u8],
) -> Result<Vec<u8>, Argon2Error> {
    let params = Params::new(time_cost, memory_cost_kib, parallelism, output_length)?;
    let inputs = Inputs::new(password, salt);
    Argon2::new(Algorithm::Argon2d, params).hash(&inputs)
}

/// An Argon2 instance: an algorithm paired with validated cost parameters.
///
/// Each call allocates its own arena, so one instance can be shared between threads and
/// used concurrently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Argon2 {
    algorithm: Algorithm,
    params: Params,
}

impl Argon2 {
    /// Pairs an algorithm with parameters.
    pub fn new(algorithm: Algorithm, params: Params) -> Self {
        Self { algorithm, params }
    }

    /// The algorithm used by this instance.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// The parameters used by this instance.
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Derives a tag of `params().output_len()` bytes into a new buffer.
    pub fn hash(&self, inputs: &Inputs<'_>) -> Result<Vec<u8>, Argon2Error> {
        inputs.validate()?;

        let mut out = vec![0u8; self.params.output_len() as usize];
        self.hash_into(inputs, &mut out)?;
        Ok(out)
    }

    /// Derives a tag into `out`, which must be exactly `params().output_len()` bytes long.
    ///
    /// On error `out` is left untouched.
    pub fn hash_into(&self, inputs: &Inputs<'_>, out: &mut [u8]) -> Result<(), Argon2Error> {
        let _span = tracing::debug_span!(
            "derive",
            algorithm = self.algorithm.ident(),
            t_cost = self.params.t_cost(),
            m_cost = self.params.m_cost_kib(),
            lanes = self.params.lanes(),
        )
        .entered();

        if out.len() != self.params.output_len() as usize {
            return Err(Argon2Error::InvalidOutputLength);
        }
        inputs.validate()?;

        let geometry = self.params.geometry();
        let mut arena = Arena::allocate(&geometry)?;

        initialize(&mut arena, &geometry, self.algorithm, &self.params, inputs)?;
        tracing::trace!("initial blocks seeded");

        let pool = worker_pool(geometry.lanes);
        fill_memory(&mut arena, &geometry, self.algorithm, pool.as_ref());

        finalize(&arena, &geometry, out)?;
        tracing::debug!(blocks = geometry.memory_blocks, "derivation complete");

        Ok(())
    }
}

/// One worker per lane. Without a pool the lanes of a slice simply run one after another.
fn worker_pool(lanes: u32) -> Option<ThreadPool> {
    if lanes < 2 {
        return None;
    }

    match rayon::ThreadPoolBuilder::new()
        .num_threads(lanes as usize)
        .thread_name(|i| format!("argon2-lane-{i}"))
        .build()
    {
        Ok(pool) => Some(pool),
        Err(e) => {
            tracing::warn!(
                error = %e,
                lanes,
                "could not start lane workers, filling lanes sequentially"
            );
            None
        }
    }
}

/// `H0`: a 64-byte BLAKE2b digest over every parameter and input.
///
/// The BLAKE2b state that absorbed the password lives in the frames of `absorb_inputs` and
/// cannot be wiped through the `blake2` API, so that stack region is overwritten before
/// returning.
fn initial_hash(
    algorithm: Algorithm,
    params: &Params,
    inputs: &Inputs<'_>,
) -> Result<Zeroizing<[u8; PREHASH_DIGEST_LENGTH]>, Argon2Error> {
    let h0 = absorb_inputs(algorithm, params, inputs);
    scrub_stack();
    h0
}

#[inline(never)]
fn absorb_inputs(
    algorithm: Algorithm,
    params: &Params,
    inputs: &Inputs<'_>,
) -> Result<Zeroizing<[u8; PREHASH_DIGEST_LENGTH]>, Argon2Error> {
    let mut hasher =
        Blake2bVar::new(PREHASH_DIGEST_LENGTH).map_err(|_| Argon2Error::InvalidOutputLength)?;

    for value in [
        params.lanes(),
        params.output_len(),
        params.m_cost_kib(),
        params.t_cost(),
        VERSION,
        algorithm.type_code(),
    ] {
        hasher.update(&value.to_le_bytes());
    }

    for (field, error) in [
        (inputs.password, Argon2Error::InvalidPasswordLength),
        (inputs.salt, Argon2Error::InvalidSaltLength),
        (inputs.secret, Argon2Error::InvalidSecretLength),
        (
            inputs.associated_data,
            Argon2Error::InvalidAssociatedDataLength,
        ),
    ] {
        let len = u32::try_from(field.len()).map_err(|_| error)?;
        hasher.update(&len.to_le_bytes());
        hasher.update(field);
    }

    let mut h0 = Zeroizing::new([0u8; PREHASH_DIGEST_LENGTH]);
    hasher
        .finalize_variable(&mut h0[..])
        .map_err(|_| Argon2Error::InvalidOutputLength)?;

    Ok(h0)
}

/// Seeds blocks 0 and 1 of every lane with `H'(1024, H0 || LE32(block) || LE32(lane))`.
fn initialize(
    arena: &mut Arena,
    geometry: &Geometry,
    algorithm: Algorithm,
    params: &Params,
    inputs: &Inputs<'_>,
) -> Result<(), Argon2Error> {
    let h0 = initial_hash(algorithm, params, inputs)?;

    let mut seed = Zeroizing::new([0u8; PREHASH_SEED_LENGTH]);
    seed[..PREHASH_DIGEST_LENGTH].copy_from_slice(&h0[..]);

    let mut bytes = Zeroizing::new([0u8; BLOCK_SIZE]);

    for lane in 0..geometry.lanes {
        seed[PREHASH_DIGEST_LENGTH + 4..].copy_from_slice(&lane.to_le_bytes());

        for index in 0..2u32 {
            seed[PREHASH_DIGEST_LENGTH..PREHASH_DIGEST_LENGTH + 4]
                .copy_from_slice(&index.to_le_bytes());

            blake2b_long(&mut bytes[..], &[&seed[..]])?;
            arena.block_mut(lane, index).load(&bytes);
        }
    }
    scrub_stack();

    Ok(())
}

/// XORs the last block of every lane together and hashes the result down to `out`.
fn finalize(arena: &Arena, geometry: &Geometry, out: &mut [u8]) -> Result<(), Argon2Error> {
    let last = geometry.lane_length - 1;

    let mut accumulator = Zeroizing::new(Block::ZERO);
    accumulator.copy_from(arena.block(0, last));
    for lane in 1..geometry.lanes {
        accumulator.xor_with(arena.block(lane, last));
    }

    let mut bytes = Zeroizing::new([0u8; BLOCK_SIZE]);
    accumulator.store(&mut bytes);

    let result = blake2b_long(out, &[&bytes[..]]);
    scrub_stack();
    result
}
