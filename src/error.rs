use thiserror::Error;

/// Errors that may occur when deriving a key or handling a hash with this crate
///
/// Every variant except [`Argon2Error::AllocationFailed`] and
/// [`Argon2Error::SaltGenerationFailed`] describes bad caller input and will fail again if
/// retried with the same arguments.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Argon2Error {
    /// The number of passes over memory was zero
    #[error("Argon2Error: Invalid time cost: at least 1 pass is required")]
    InvalidTimeCost,

    /// The memory cost was below 8 KiB per lane, or the arena it describes cannot be addressed
    /// on this platform
    #[error("Argon2Error: Invalid memory cost: need at least 8 KiB per lane")]
    InvalidMemoryCost,

    /// The lane count was zero or greater than 2^24 - 1
    #[error("Argon2Error: Invalid parallelism: lane count must be between 1 and 16777215")]
    InvalidParallelism,

    /// The requested tag was shorter than 4 bytes or longer than 2^32 - 1 bytes
    #[error("Argon2Error: Invalid output length: tag must be between 4 and 4294967295 bytes")]
    InvalidOutputLength,

    /// The password was longer than 2^32 - 1 bytes
    #[error("Argon2Error: Invalid password length: password is too long")]
    InvalidPasswordLength,

    /// The salt was shorter than 8 bytes or longer than 2^32 - 1 bytes
    #[error("Argon2Error: Invalid salt length: salt must be between 8 and 4294967295 bytes")]
    InvalidSaltLength,

    /// The secret key was longer than 2^32 - 1 bytes
    #[error("Argon2Error: Invalid secret length: secret is too long")]
    InvalidSecretLength,

    /// The associated data was longer than 2^32 - 1 bytes
    #[error("Argon2Error: Invalid associated data length: associated data is too long")]
    InvalidAssociatedDataLength,

    /// The memory arena could not be reserved. Retrying with a smaller memory cost may succeed.
    #[error("Argon2Error: Allocation failed: could not reserve the memory arena")]
    AllocationFailed,

    /// The operating system's random number generator could not produce a salt
    #[error("Argon2Error: Salt generation failed: {0}")]
    SaltGenerationFailed(String),

    /// Indicates that a provided hash was expected to be valid, but is invalid. This
    /// normally occurs when a hash string is improperly formatted.
    #[error("Argon2Error: Invalid hash: {0}")]
    InvalidHash(&'static str),
}

impl Argon2Error {
    /// Returns `true` if the failure was caused by resource exhaustion rather than by the
    /// arguments, meaning the same call may succeed later or with a smaller memory cost.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Argon2Error::AllocationFailed | Argon2Error::SaltGenerationFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_keeps_prefix() {
        assert_eq!(
            Argon2Error::InvalidHash("Invalid m").to_string(),
            "Argon2Error: Invalid hash: Invalid m"
        );
        assert!(Argon2Error::InvalidTimeCost
            .to_string()
            .starts_with("Argon2Error: Invalid time cost"));
    }

    #[test]
    fn test_only_resource_errors_are_retryable() {
        assert!(Argon2Error::AllocationFailed.is_retryable());
        let no_entropy = Argon2Error::SaltGenerationFailed(String::from("no entropy"));
        assert!(no_entropy.is_retryable());
        assert!(!Argon2Error::InvalidMemoryCost.is_retryable());
        assert!(!Argon2Error::InvalidSaltLength.is_retryable());
    }
}
