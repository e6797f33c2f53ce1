#![deny(missing_docs)]

//! A pure Rust implementation of [Argon2](https://en.wikipedia.org/wiki/Argon2) for deriving
//! keys and hashing passwords. Argon2 is a memory-hard
//! [key derivation function](https://en.wikipedia.org/wiki/Key_derivation_function) and was
//! the winner of the [Password Hashing Competition](https://www.password-hashing.net).
//!
//! The centre of the crate is Argon2d, which chooses the blocks it mixes from the data already
//! in memory. Every derivation owns its memory arena: the arena is reserved fallibly, filled
//! lane by lane (lanes within a slice run on their own worker threads), and overwritten with
//! zeros before it is freed, whether the derivation succeeded or not. Failures are reported
//! as [`Argon2Error`] values and never as an all-zero tag.
//!
//! Argon2i and Argon2id, a secret key and associated data are supported as well, as is the
//! usual `$argon2d$v=19$...` hash string format.
//!
//! # Usage
//!
//! To use argon2-native, add the following to your Cargo.toml:
//!
//! ```toml
//! [dependencies]
//! argon2-native = "0.1"
//! ```
//!
//! # Examples
//!
//! Derive a 32-byte Argon2d key (2 passes over 64 MiB, 1 lane):
//!
//! ```rust
//! let key = argon2_native::derive(2, 65536, 1, 32, b"password", b"somesalt").unwrap();
//!
//! assert_eq!(
//!     key[..4],
//!     [0x95, 0x5e, 0x5d, 0x5b],
//! );
//! ```
//!
//! Bad parameters are rejected before any memory is reserved:
//!
//! ```rust
//! use argon2_native::Argon2Error;
//!
//! assert_eq!(
//!     argon2_native::derive(1, 16, 4, 32, b"password", b"somesalt"),
//!     Err(Argon2Error::InvalidMemoryCost),
//! );
//! ```
//!
//! Use an explicit instance to pick the algorithm, add a secret key, or write into your own
//! buffer:
//!
//! ```rust
//! use argon2_native::{Algorithm, Argon2, Inputs, Params};
//!
//! let params = Params::new(3, 4096, 4, 32).unwrap();
//! let argon2 = Argon2::new(Algorithm::Argon2id, params);
//!
//! let mut key = [0u8; 32];
//! argon2
//!     .hash_into(&Inputs::new(b"password", b"somesalt").secret(b"pepper"), &mut key)
//!     .unwrap();
//! ```
//!
//! Hash a password, then verify the hash:
//!
//! ```rust
//! use argon2_native::Hasher;
//!
//! let password = b"password";
//! let hash = Hasher::default()
//!         .iterations(2)
//!         .memory_cost_kib(256)
//!         .hash(password)
//!         .unwrap();
//!
//! assert!(hash.verify(password));
//! ```
//!
//! Change the parameters used for hashing:
//!
//! ```rust
//! use argon2_native::{Algorithm, Hasher};
//!
//! let password = b"password";
//!
//! let hash = Hasher::new()
//!         .algorithm(Algorithm::Argon2d)
//!         .salt_length(24)
//!         .hash_length(42)
//!         .iterations(3)
//!         .memory_cost_kib(1024)
//!         .threads(2)
//!         .hash(password)
//!         .unwrap();
//!
//! assert!(hash.verify(password));
//! assert_eq!(hash.as_bytes().len(), 42);
//! assert_eq!(hash.salt_bytes().len(), 24);
//! ```
//!
//! Verify a hash from a hash string:
//!
//! ```rust
//! use argon2_native::Hash;
//! use std::str::FromStr;
//!
//! let password = b"password";
//! let hash_string = "$argon2d$v=19$m=256,t=2,p=4$c29tZXNhbHQ$PlUse1FQ+lgrnuMne1oTmXNf4r7rEHlXUcM+R1k9VSg";
//!
//! let hash = Hash::from_str(hash_string).unwrap();
//! assert!(hash.verify(password));
//! ```
//!
//! Use a secret (sometimes called a
//! "[pepper](https://en.wikipedia.org/wiki/Pepper_(cryptography))") for hashing and
//! verification:
//!
//! ```rust
//! use argon2_native::{Hasher, Secret};
//!
//! let password = b"password";
//! let secret = b"secret";
//!
//! let hash = Hasher::default()
//!         .iterations(2)
//!         .memory_cost_kib(256)
//!         .secret(secret.into())
//!         .hash(password)
//!         .unwrap();
//!
//! assert!(hash.verify_with_secret(password, secret.into()));
//! ```
//!
//! # Logging
//!
//! Derivations emit [`tracing`](https://docs.rs/tracing) spans and events at the `debug` and
//! `trace` levels. Passwords, secrets, salts and tags are never recorded.

mod arena;
mod blake2b_long;
mod block;
mod error;
mod hasher;
mod kdf;
mod lexer;
mod params;
mod schedule;

pub use error::Argon2Error;
pub use hasher::{Hash, Hasher, Secret};
pub use kdf::{derive, Argon2};
pub use params::{
    Algorithm, Inputs, Params, BLOCK_SIZE, MAX_LANES, MIN_MEMORY_PER_LANE_KIB, MIN_OUTPUT_LENGTH,
    MIN_SALT_LENGTH, SYNC_POINTS, VERSION,
};
