// RSA Error Types
// Shared error taxonomy for key generation, the blob codec, and the transform

/// Unified error type for RSA toolkit operations.
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// A caller-supplied argument violates a documented precondition.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Key generation exhausted its retry budget without a usable pair.
    #[error("key generation failed after {attempts} attempts")]
    KeyGenerationFailure { attempts: u32 },

    /// A key blob or ciphertext failed structural decoding.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// The plaintext, read as an integer, does not fit below the modulus.
    #[error("plaintext of {plaintext_bits} bits does not fit below the {modulus_bits}-bit modulus")]
    PlaintextOverflow {
        plaintext_bits: u64,
        modulus_bits: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_carry_the_details() {
        let err = KeyError::InvalidParameter("bit length 31 is not a multiple of 8".into());
        assert_eq!(
            err.to_string(),
            "invalid parameter: bit length 31 is not a multiple of 8"
        );

        let err = KeyError::KeyGenerationFailure { attempts: 4 };
        assert_eq!(err.to_string(), "key generation failed after 4 attempts");

        let err = KeyError::PlaintextOverflow {
            plaintext_bits: 72,
            modulus_bits: 64,
        };
        assert_eq!(
            err.to_string(),
            "plaintext of 72 bits does not fit below the 64-bit modulus"
        );
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeyError>();
    }
}
