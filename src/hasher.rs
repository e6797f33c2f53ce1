use crate::error::Argon2Error;
use crate::kdf::Argon2;
use crate::lexer::TokenizedHash;
use crate::params::{Algorithm, Inputs, Params, VERSION};

use base64::engine::general_purpose::STANDARD_NO_PAD as b64_stdnopad;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use std::default::Default;
use std::fmt;
use std::str::FromStr;
use zeroize::Zeroize;

/// A secret that mixes with a password (and a salt) to create a hash. This is sometimes
/// referred to as a "[pepper](https://en.wikipedia.org/wiki/Pepper_(cryptography))."
///
/// A 32-byte key is recommended. Do not use an alphanumeric password or passphrase; the
/// entrophy of a 32-character password is much lower than the entrophy of a 32-byte key. This
/// key should be generated with a cryptographically-secure random number generator and stored
/// securely.
#[derive(Clone, Copy)]
pub struct Secret<'a>(&'a [u8]);

impl<'a> Secret<'a> {
    /// Wraps a reference to a slice containing a secret key
    pub fn using<T: AsRef<[u8]>>(secret: &'a T) -> Self {
        Self(secret.as_ref())
    }
}

impl fmt::Debug for Secret<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(<{} bytes>)", self.0.len())
    }
}

impl<'a> From<&'a [u8]> for Secret<'a> {
    fn from(secret: &'a [u8]) -> Self {
        Self(secret)
    }
}

impl<'a> From<&'a Vec<u8>> for Secret<'a> {
    fn from(secret: &'a Vec<u8>) -> Self {
        Self(secret)
    }
}

impl<'a, const SIZE: usize> From<&'a [u8; SIZE]> for Secret<'a> {
    fn from(secret: &'a [u8; SIZE]) -> Self {
        Self(secret)
    }
}

impl<'a> From<&'a str> for Secret<'a> {
    fn from(secret: &'a str) -> Self {
        Self(secret.as_bytes())
    }
}

impl<'a> From<&'a String> for Secret<'a> {
    fn from(secret: &'a String) -> Self {
        Self(secret.as_bytes())
    }
}

/// A builder for a hash. Parameters for hashing, such as the algorithm, the costs and the
/// salt, are set with chained calls and the hash is produced by [`Hasher::hash()`].
#[derive(Clone, Debug)]
pub struct Hasher<'a> {
    alg: Algorithm,
    custom_salt: Option<&'a [u8]>,
    salt_len: u32,
    hash_len: u32,
    iterations: u32,
    mem_cost_kib: u32,
    threads: u32,
    secret: Option<Secret<'a>>,
    associated_data: Option<&'a [u8]>,
}

impl Default for Hasher<'_> {
    /// Create a new `Hasher` with default values.
    ///
    /// This provides some reasonable defaults, but it is recommended that you tinker with
    /// these parameters to find the best settings for your application. The more resources the
    /// hashing requires, the stronger the hash. Increase the memory cost (and perhaps the
    /// parallelization factor) as high as your application can afford, then likewise raise the
    /// iteration count.
    ///
    /// The defaults are as follows:
    ///
    /// * Algorithm: Argon2d
    /// * Salt Length: 16 bytes
    /// * Hash Length: 32 bytes
    /// * Iterations: 18
    /// * Memory Cost: 62500 kibibytes (equal to 64 megabytes)
    /// * Parallelization Factor: 1 thread
    fn default() -> Self {
        Self {
            alg: Algorithm::Argon2d,
            custom_salt: None,
            salt_len: 16,
            hash_len: 32,
            iterations: 18,
            mem_cost_kib: 62500,
            threads: 1,
            secret: None,
            associated_data: None,
        }
    }
}

impl<'a> Hasher<'a> {
    /// Create a new `Hasher` with default values. See [`Hasher::default()`] for the values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Specifies the hashing algorithm to use.
    ///
    /// Argon2d is the default and what [`derive()`](crate::derive) computes. Argon2i and
    /// Argon2id avoid password-dependent memory access for (part of) the computation; prefer
    /// them when an attacker may share the hashing machine's caches.
    pub fn algorithm(mut self, alg: Algorithm) -> Self {
        self.alg = alg;
        self
    }

    /// When left unspecified, a salt is generated using a cryptographically-secure random
    /// number generator. Only use this function if you are trying to generate a hash
    /// deterministically with a known salt and a randomly generated salt will not suffice.
    pub fn custom_salt<SLT>(mut self, salt: &'a SLT) -> Self
    where
        SLT: AsRef<[u8]> + ?Sized,
    {
        self.custom_salt = Some(salt.as_ref());
        self
    }

    /// The length of the salt for the hash, in bytes. Must be at least 8; 16 bytes is a
    /// reasonable default salt length.
    ///
    /// If a salt is specified manually using [`Hasher::custom_salt()`], the length of the
    /// provided salt will override the length specified here.
    pub fn salt_length(mut self, salt_len: u32) -> Self {
        self.salt_len = salt_len;
        self
    }

    /// The length of the resulting hash, in bytes. Must be at least 4.
    ///
    /// Note that the length of the hash _string_ will be different; the hash string specifies
    /// parameters and the salt used to generate the hash, and base64-encodes both.
    pub fn hash_length(mut self, hash_len: u32) -> Self {
        self.hash_len = hash_len;
        self
    }

    /// The number of passes over memory.
    pub fn iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// The amount of memory required to compute a hash, in kibibytes. Must be at least 8 KiB
    /// per thread; the value is rounded down to a multiple of `4 * threads`.
    ///
    /// Set this parameter as high as you can afford to.
    pub fn memory_cost_kib(mut self, cost: u32) -> Self {
        self.mem_cost_kib = cost;
        self
    }

    /// The number of lanes, each of which is filled by its own worker thread. Changing this
    /// changes the resulting hash.
    pub fn threads(mut self, threads: u32) -> Self {
        self.threads = threads;
        self
    }

    /// A secret that mixes with a password (and a salt) to create a hash. This is sometimes
    /// referred to as a "[pepper](https://en.wikipedia.org/wiki/Pepper_(cryptography))."
    ///
    /// The secret is not part of the hash string, so the same secret must be supplied to
    /// [`Hash::verify_with_secret()`].
    pub fn secret(mut self, secret: Secret<'a>) -> Self {
        self.secret = Some(secret);
        self
    }

    /// Context bound into the hash alongside the password. Like the secret, it is not
    /// recorded in the hash string.
    pub fn associated_data<AD>(mut self, associated_data: &'a AD) -> Self
    where
        AD: AsRef<[u8]> + ?Sized,
    {
        self.associated_data = Some(associated_data.as_ref());
        self
    }

    /// Consumes the `Hasher` and returns a hash.
    ///
    /// This is an expensive operation. For some appliations, it might make sense to move this
    /// operation to a separate thread using `std::thread` or something like
    /// [the Rayon crate](https://docs.rs/rayon/latest/rayon/) to avoid blocking main threads.
    pub fn hash<P>(self, password: &P) -> Result<Hash, Argon2Error>
    where
        P: AsRef<[u8]> + ?Sized,
    {
        let params = Params::new(
            self.iterations,
            self.mem_cost_kib,
            self.threads,
            self.hash_len,
        )?;

        let salt = match self.custom_salt {
            Some(s) => s.to_vec(),
            None => random_salt(self.salt_len)?,
        };

        let mut inputs = Inputs::new(password.as_ref(), &salt);
        if let Some(s) = self.secret {
            inputs = inputs.secret(s.0);
        }
        if let Some(ad) = self.associated_data {
            inputs = inputs.associated_data(ad);
        }

        let hash = Argon2::new(self.alg, params).hash(&inputs)?;

        Ok(Hash {
            alg: self.alg,
            mem_cost_kib: self.mem_cost_kib,
            iterations: self.iterations,
            threads: self.threads,
            salt,
            hash,
        })
    }
}

fn random_salt(salt_len: u32) -> Result<Vec<u8>, Argon2Error> {
    let salt_len = usize::try_from(salt_len).map_err(|_| Argon2Error::InvalidSaltLength)?;
    if salt_len < crate::params::MIN_SALT_LENGTH {
        return Err(Argon2Error::InvalidSaltLength);
    }

    let mut salt = vec![0u8; salt_len];
    OsRng
        .try_fill_bytes(&mut salt)
        .map_err(|e| Argon2Error::SaltGenerationFailed(e.to_string()))?;

    Ok(salt)
}

/// A container for an Argon2 hash, the corresponding salt, and the parameters used for
/// hashing
///
/// The hash bytes are wiped when the `Hash` is dropped.
#[derive(Clone)]
pub struct Hash {
    alg: Algorithm,
    mem_cost_kib: u32,
    iterations: u32,
    threads: u32,
    salt: Vec<u8>,
    hash: Vec<u8>,
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hash")
            .field("alg", &self.alg)
            .field("mem_cost_kib", &self.mem_cost_kib)
            .field("iterations", &self.iterations)
            .field("threads", &self.threads)
            .field("salt_len", &self.salt.len())
            .field("hash", &format_args!("<{} bytes>", self.hash.len()))
            .finish()
    }
}

impl fmt::Display for Hash {
    /// Generates a hash string. Aside from the hash, the hash string also includes the salt
    /// and paramters used to generate the hash, making it easy to store in a database or a
    /// cache. This string is formatted to a standard shared by most implementations of argon2,
    /// so other argon2 libraries should be able to use this hash string.
    ///
    /// A hash string looks something like this:
    ///
    /// _$argon2d$v=19$m=65536,t=2,p=1$c29tZXNhbHQ$lV5dWxY6G2C7o1/DbQSWR0+6T2tZrVNihmbwf7L5Pq8_
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "${}$v={}$m={},t={},p={}${}${}",
            self.alg.ident(),
            VERSION,
            self.mem_cost_kib,
            self.iterations,
            self.threads,
            b64_stdnopad.encode(&self.salt),
            b64_stdnopad.encode(&self.hash),
        )
    }
}

impl FromStr for Hash {
    type Err = Argon2Error;

    /// Deserializes a hash string into parts (e.g. the hash, the salt, parameters) that can
    /// be used for purposes such as verification or encryption.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokenized_hash = TokenizedHash::from_str(s)?;

        if tokenized_hash.v != VERSION {
            return Err(Argon2Error::InvalidHash("Hash version is unsupported"));
        }

        let decoded_salt = match b64_stdnopad.decode(tokenized_hash.b64_salt) {
            Ok(s) => s,
            Err(_) => {
                return Err(Argon2Error::InvalidHash(
                    "Invalid character in base64-encoded salt",
                ))
            }
        };

        let decoded_hash = match b64_stdnopad.decode(tokenized_hash.b64_hash) {
            Ok(h) => h,
            Err(_) => {
                return Err(Argon2Error::InvalidHash(
                    "Invalid character in base64-encoded hash",
                ))
            }
        };

        Ok(Self {
            alg: tokenized_hash.alg,
            mem_cost_kib: tokenized_hash.mem_cost_kib,
            iterations: tokenized_hash.iterations,
            threads: tokenized_hash.threads,
            salt: decoded_salt,
            hash: decoded_hash,
        })
    }
}

impl Drop for Hash {
    fn drop(&mut self) {
        self.hash.zeroize();
    }
}

impl Hash {
    /// Assembles a `Hash` from a raw hash, its salt and the parameters that produced it.
    pub fn from_parts(
        hash: &[u8],
        salt: &[u8],
        alg: Algorithm,
        mem_cost_kib: u32,
        iterations: u32,
        threads: u32,
    ) -> Self {
        Self {
            alg,
            mem_cost_kib,
            iterations,
            threads,
            salt: salt.to_vec(),
            hash: hash.to_vec(),
        }
    }

    /// Returns a reference to a byte slice of the computed hash/key.
    pub fn as_bytes(&self) -> &[u8] {
        &self.hash
    }

    /// Returns a reference to a byte slice of the salt used to generate the hash.
    pub fn salt_bytes(&self) -> &[u8] {
        &self.salt
    }

    /// The algorithm that produced the hash.
    pub fn algorithm(&self) -> Algorithm {
        self.alg
    }

    /// The memory cost, in kibibytes, that produced the hash.
    pub fn memory_cost_kib(&self) -> u32 {
        self.mem_cost_kib
    }

    /// The number of passes that produced the hash.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// The number of lanes that produced the hash.
    pub fn threads(&self) -> u32 {
        self.threads
    }

    /// Checks if the hash matches the provided password.
    ///
    /// Because verification requires re-hashing the password, this is an expensive operation.
    pub fn verify<P>(&self, password: &P) -> bool
    where
        P: AsRef<[u8]> + ?Sized,
    {
        self.verify_inner(password, None, None)
    }

    /// Checks if the hash matches the provided password using the provided secret.
    ///
    /// Because verification requires re-hashing the password, this is an expensive operation.
    pub fn verify_with_secret<P>(&self, password: &P, secret: Secret) -> bool
    where
        P: AsRef<[u8]> + ?Sized,
    {
        self.verify_inner(password, Some(secret), None)
    }

    /// Checks if the hash matches the provided password and the associated data it was created
    /// with. Pass `secret` if the hash was also created with one.
    ///
    /// Because verification requires re-hashing the password, this is an expensive operation.
    pub fn verify_with_associated_data<P>(
        &self,
        password: &P,
        secret: Option<Secret>,
        associated_data: &[u8],
    ) -> bool
    where
        P: AsRef<[u8]> + ?Sized,
    {
        self.verify_inner(password, secret, Some(associated_data))
    }

    #[inline]
    fn verify_inner<P>(
        &self,
        password: &P,
        secret: Option<Secret>,
        associated_data: Option<&[u8]>,
    ) -> bool
    where
        P: AsRef<[u8]> + ?Sized,
    {
        let hash_length: u32 = match self.hash.len().try_into() {
            Ok(l) => l,
            Err(_) => return false,
        };

        let mut hash_builder = Hasher::default()
            .algorithm(self.alg)
            .custom_salt(&self.salt)
            .hash_length(hash_length)
            .iterations(self.iterations)
            .memory_cost_kib(self.mem_cost_kib)
            .threads(self.threads);

        if let Some(s) = secret {
            hash_builder = hash_builder.secret(s);
        }
        if let Some(ad) = associated_data {
            hash_builder = hash_builder.associated_data(ad);
        }

        let hashed_password = match hash_builder.hash(password) {
            Ok(h) => h,
            Err(e) => {
                tracing::debug!(error = %e, "verification could not re-derive the hash");
                return false;
            }
        };

        if self.hash.len() != hashed_password.hash.len() || self.hash.is_empty() {
            return false;
        }

        // Every byte is compared so the time taken does not depend on where a mismatch is
        let hashes_dont_match = hashed_password
            .hash
            .iter()
            .zip(self.hash.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b));

        hashes_dont_match == 0
    }
}
