use crate::error::Argon2Error;

/// Argon2 version 1.3, the only version this crate produces or accepts (`v=19`).
pub const VERSION: u32 = 0x13;

/// Size of one memory block in bytes.
pub const BLOCK_SIZE: usize = 1024;

/// Number of slices each lane is cut into. Lanes synchronize at every slice boundary.
pub const SYNC_POINTS: u32 = 4;

/// Shortest tag that may be requested, in bytes.
pub const MIN_OUTPUT_LENGTH: u32 = 4;

/// Shortest salt that is accepted, in bytes.
pub const MIN_SALT_LENGTH: usize = 8;

/// Largest lane count that is accepted.
pub const MAX_LANES: u32 = 0x00ff_ffff;

/// Every lane needs at least two blocks per slice.
pub const MIN_MEMORY_PER_LANE_KIB: u32 = 2 * SYNC_POINTS;

const MAX_INPUT_LENGTH: usize = u32::MAX as usize;

/// The Argon2 spec consist of 3 different algorithms: one that aims to be resistant to GPU
/// cracking attacks (argon2d), one that aims to be resistant to side-channel attacks
/// (argon2i), and a hybrid algorithm that aims to be resistant to both types of attacks.
/// See <https://en.wikipedia.org/wiki/Argon2> for more information.
///
/// Argon2d picks reference blocks from the contents of memory, which makes time-memory
/// trade-offs expensive but means memory access patterns depend on the password. Only use it
/// where an attacker cannot observe the hashing machine's cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    /// GPU-cracking attack resistant/memory-hard
    Argon2d,

    /// Side-channel attack resistant
    Argon2i,

    /// GPU-cracking attack resistant/memory-hard and side-channel attack resistant
    Argon2id,
}

impl Algorithm {
    /// The identifier used in hash strings, e.g. `argon2d`.
    pub fn ident(self) -> &'static str {
        match self {
            Algorithm::Argon2d => "argon2d",
            Algorithm::Argon2i => "argon2i",
            Algorithm::Argon2id => "argon2id",
        }
    }

    pub(crate) fn type_code(self) -> u32 {
        match self {
            Algorithm::Argon2d => 0,
            Algorithm::Argon2i => 1,
            Algorithm::Argon2id => 2,
        }
    }

    /// Whether reference blocks for the given segment come from address blocks rather than
    /// from the data in memory.
    pub(crate) fn is_data_independent(self, pass: u32, slice: u32) -> bool {
        match self {
            Algorithm::Argon2d => false,
            Algorithm::Argon2i => true,
            Algorithm::Argon2id => pass == 0 && slice < SYNC_POINTS / 2,
        }
    }
}

/// Validated cost parameters for a derivation.
///
/// A `Params` value can only be obtained through [`Params::new`], so holding one means the
/// numeric parameters have already been checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Params {
    t_cost: u32,
    m_cost: u32,
    lanes: u32,
    output_len: u32,
}

impl Params {
    /// Checks and bundles the cost parameters.
    ///
    /// * `t_cost` - number of passes over memory, at least 1
    /// * `m_cost_kib` - memory size in kibibytes, at least 8 per lane
    /// * `lanes` - degree of parallelism, between 1 and 2^24 - 1
    /// * `output_len` - length of the derived tag in bytes, at least 4
    pub fn new(
        t_cost: u32,
        m_cost_kib: u32,
        lanes: u32,
        output_len: u32,
    ) -> Result<Self, Argon2Error> {
        if output_len < MIN_OUTPUT_LENGTH {
            return Err(Argon2Error::InvalidOutputLength);
        }

        if t_cost == 0 {
            return Err(Argon2Error::InvalidTimeCost);
        }

        if lanes == 0 || lanes > MAX_LANES {
            return Err(Argon2Error::InvalidParallelism);
        }

        // lanes <= 2^24 - 1, so this cannot overflow a u64
        if u64::from(m_cost_kib) < u64::from(MIN_MEMORY_PER_LANE_KIB) * u64::from(lanes) {
            return Err(Argon2Error::InvalidMemoryCost);
        }

        let params = Self {
            t_cost,
            m_cost: m_cost_kib,
            lanes,
            output_len,
        };

        let memory_blocks = params.geometry().memory_blocks as usize;
        match memory_blocks.checked_mul(BLOCK_SIZE) {
            Some(bytes) if bytes <= isize::MAX as usize => Ok(params),
            _ => Err(Argon2Error::InvalidMemoryCost),
        }
    }

    /// Number of passes over memory.
    pub fn t_cost(&self) -> u32 {
        self.t_cost
    }

    /// Requested memory size in kibibytes, before rounding.
    pub fn m_cost_kib(&self) -> u32 {
        self.m_cost
    }

    /// Number of lanes.
    pub fn lanes(&self) -> u32 {
        self.lanes
    }

    /// Length of the derived tag in bytes.
    pub fn output_len(&self) -> u32 {
        self.output_len
    }

    /// Number of 1 KiB blocks actually used: the memory cost clamped to 8 blocks per lane and
    /// rounded down to a multiple of `4 * lanes`.
    pub fn block_count(&self) -> u32 {
        self.geometry().memory_blocks
    }

    pub(crate) fn geometry(&self) -> Geometry {
        let granularity = SYNC_POINTS * self.lanes;
        let clamped = self.m_cost.max(MIN_MEMORY_PER_LANE_KIB * self.lanes);
        let memory_blocks = clamped - clamped % granularity;
        let lane_length = memory_blocks / self.lanes;

        Geometry {
            passes: self.t_cost,
            lanes: self.lanes,
            memory_blocks,
            lane_length,
            segment_length: lane_length / SYNC_POINTS,
        }
    }
}

/// Shape of the memory matrix for one derivation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) passes: u32,
    pub(crate) lanes: u32,
    pub(crate) memory_blocks: u32,
    pub(crate) lane_length: u32,
    pub(crate) segment_length: u32,
}

/// The byte inputs of a derivation. The secret key and associated data are optional and
/// default to empty.
///
/// `Inputs` only borrows its buffers; wiping the password afterwards is up to the caller.
#[derive(Clone, Copy, Default)]
pub struct Inputs<'a> {
    pub(crate) password: &'a [u8],
    pub(crate) salt: &'a [u8],
    pub(crate) secret: &'a [u8],
    pub(crate) associated_data: &'a [u8],
}

impl<'a> Inputs<'a> {
    /// Wraps a password and salt.
    pub fn new(password: &'a [u8], salt: &'a [u8]) -> Self {
        Self {
            password,
            salt,
            secret: &[],
            associated_data: &[],
        }
    }

    /// Adds a secret key (sometimes called a pepper) that is mixed into the initial hash.
    pub fn secret(mut self, secret: &'a [u8]) -> Self {
        self.secret = secret;
        self
    }

    /// Adds associated data that is mixed into the initial hash.
    pub fn associated_data(mut self, associated_data: &'a [u8]) -> Self {
        self.associated_data = associated_data;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), Argon2Error> {
        if self.password.len() > MAX_INPUT_LENGTH {
            return Err(Argon2Error::InvalidPasswordLength);
        }

        if self.salt.len() < MIN_SALT_LENGTH || self.salt.len() > MAX_INPUT_LENGTH {
            return Err(Argon2Error::InvalidSaltLength);
        }

        if self.secret.len() > MAX_INPUT_LENGTH {
            return Err(Argon2Error::InvalidSecretLength);
        }

        if self.associated_data.len() > MAX_INPUT_LENGTH {
            return Err(Argon2Error::InvalidAssociatedDataLength);
        }

        Ok(())
    }
}

impl std::fmt::Debug for Inputs<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Inputs")
            .field("password", &format_args!("<{} bytes>", self.password.len()))
            .field("salt_len", &self.salt.len())
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("associated_data_len", &self.associated_data.len())
            .finish()
    }
}
