// RSA Key Generation
// Margin-split prime searches, exponent validation, and blob packing

use std::thread;

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand::{thread_rng, Rng};
use tracing::{debug, info, warn};

use super::bigint::mod_inverse;
use super::codec;
use super::error::KeyError;
use super::primegen::{search_one, SearchConfig, DEFAULT_WITNESSES};

/// Public exponent used unless configured otherwise.
pub const DEFAULT_PUBLIC_EXPONENT: u64 = 65_537;

const DEFAULT_MAX_ATTEMPTS: u32 = 4;
const MIN_KEY_BITS: u64 = 32;

/// RSA Public Key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKey {
    pub e: BigUint, // Public exponent
    pub n: BigUint, // Modulus
}

/// RSA Private Key
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PrivateKey {
    pub d: BigUint, // Private exponent
    pub n: BigUint, // Modulus (same as public)
}

/// RSA Key Pair (both halves)
#[derive(Clone, Debug)]
pub struct KeyPair {
    pub public: PublicKey,
    pub private: PrivateKey,
}

impl PublicKey {
    /// Pack as a base64 blob, exponent first
    pub fn to_blob(&self) -> String {
        codec::encode_base64(&self.e, &self.n)
    }

    /// Unpack a blob produced by [`to_blob`](Self::to_blob)
    pub fn from_blob(text: &str) -> Result<Self, KeyError> {
        let (e, n) = codec::decode_base64(text)?;
        Ok(Self { e, n })
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }
}

impl PrivateKey {
    /// Pack as a base64 blob, exponent first
    pub fn to_blob(&self) -> String {
        codec::encode_base64(&self.d, &self.n)
    }

    /// Unpack a blob produced by [`to_blob`](Self::to_blob)
    pub fn from_blob(text: &str) -> Result<Self, KeyError> {
        let (d, n) = codec::decode_base64(text)?;
        Ok(Self { d, n })
    }

    /// Get the bit length of the modulus
    pub fn bit_length(&self) -> u64 {
        self.n.bits()
    }
}

/// Tuning knobs for [`generate`].
#[derive(Clone, Debug)]
pub struct KeygenConfig {
    /// Public exponent e; coprimality with φ(n) is checked per attempt.
    pub public_exponent: u64,
    /// Miller-Rabin rounds per candidate.
    pub witnesses: u32,
    /// Attempts before giving up with [`KeyError::KeyGenerationFailure`].
    pub max_attempts: u32,
}

impl Default for KeygenConfig {
    fn default() -> Self {
        Self {
            public_exponent: DEFAULT_PUBLIC_EXPONENT,
            witnesses: DEFAULT_WITNESSES,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

impl KeygenConfig {
    pub fn with_public_exponent(mut self, e: u64) -> Self {
        self.public_exponent = e;
        self
    }

    pub fn with_witnesses(mut self, witnesses: u32) -> Self {
        self.witnesses = witnesses;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}

/// Generate an RSA key pair with a modulus of `bits` bits.
///
/// `bits` must be a multiple of 8, at least 32. Every attempt draws
/// fresh prime widths: p gets bits/2 give or take 10%, q the remainder,
/// and the two searches run concurrently. An attempt whose φ(n) shares
/// a factor with e is discarded; once `max_attempts` attempts are spent
/// the whole generation fails.
pub fn generate(bits: u64, config: &KeygenConfig) -> Result<KeyPair, KeyError> {
    if bits < MIN_KEY_BITS || bits % 8 != 0 {
        return Err(KeyError::InvalidParameter(format!(
            "key size {} must be a multiple of 8, at least {}",
            bits, MIN_KEY_BITS
        )));
    }
    if config.public_exponent < 3 || config.public_exponent % 2 == 0 {
        return Err(KeyError::InvalidParameter(format!(
            "public exponent {} must be odd, at least 3",
            config.public_exponent
        )));
    }
    if config.witnesses == 0 {
        return Err(KeyError::InvalidParameter(
            "witness count must be at least 1".to_string(),
        ));
    }

    let e = BigUint::from(config.public_exponent);
    let search_config = SearchConfig::default().with_witnesses(config.witnesses);

    for attempt in 1..=config.max_attempts {
        let (p_bits, q_bits) = split_widths(bits);
        debug!(
            "attempt {}: searching p ({} bits) and q ({} bits)",
            attempt, p_bits, q_bits
        );

        // p on a helper thread, q on this one
        let p_thread = {
            let config = search_config.clone();
            thread::Builder::new()
                .name("keygen-p".to_string())
                .spawn(move || search_one(p_bits, &config))
        };
        let q = search_one(q_bits, &search_config);
        let p = match p_thread {
            Ok(handle) => match handle.join() {
                Ok(p) => p,
                Err(_) => {
                    warn!("prime search thread for p panicked; retrying");
                    continue;
                }
            },
            Err(err) => {
                warn!(
                    "could not spawn prime search thread for p ({}); searching inline",
                    err
                );
                search_one(p_bits, &search_config)
            }
        };

        if p == q {
            debug!("p and q collided; retrying");
            continue;
        }

        let (n, d) = match derive(&p, &q, &e) {
            Some(derived) => derived,
            None => {
                warn!(
                    "attempt {}: e = {} shares a factor with φ(n); retrying",
                    attempt, e
                );
                continue;
            }
        };

        info!(
            "generated a {}-bit key pair (modulus {}..) on attempt {}",
            n.bits(),
            fingerprint(&n),
            attempt
        );

        return Ok(KeyPair {
            public: PublicKey {
                e: e.clone(),
                n: n.clone(),
            },
            private: PrivateKey { d, n },
        });
    }

    Err(KeyError::KeyGenerationFailure {
        attempts: config.max_attempts,
    })
}

/// Derive (n, d) from two distinct primes and the public exponent.
/// gcd(e, φ(n)) = 1 is checked before d is computed; a violation returns
/// None and the caller retries with fresh primes.
fn derive(p: &BigUint, q: &BigUint, e: &BigUint) -> Option<(BigUint, BigUint)> {
    let n = p * q;
    let phi = (p - 1u8) * (q - 1u8);

    if !phi.gcd(e).is_one() {
        return None;
    }

    mod_inverse(e, &phi).map(|d| (n, d))
}

/// Width of p, drawn from [half-margin, half+margin] inclusive where
/// margin is 10% of half, rounded; q gets the remainder
fn split_widths(bits: u64) -> (u64, u64) {
    let half = bits / 2;
    let margin = ((half as f64) * 0.1).round() as u64;
    let p_bits = thread_rng().gen_range(half - margin..=half + margin);
    (p_bits, bits - p_bits)
}

/// First modulus bytes as hex, for log lines
fn fingerprint(n: &BigUint) -> String {
    let bytes = n.to_bytes_be();
    let head = bytes.len().min(8);
    hex::encode(&bytes[..head])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rsa::transform;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_derive_known_pair() {
        // p=61, q=53: n=3233, φ=3120, and 17^(-1) mod 3120 = 2753
        let (n, d) = derive(&big(61), &big(53), &big(17)).unwrap();
        assert_eq!(n, big(3233));
        assert_eq!(d, big(2753));
        assert_eq!((big(17) * d) % big(3120), big(1));
    }

    #[test]
    fn test_derive_rejects_noninvertible_exponents() {
        // φ = 3120 = 13 · 240, so e = 13 shares a factor with it
        assert!(derive(&big(61), &big(53), &big(13)).is_none());
    }

    #[test]
    fn test_split_widths_stay_inside_the_margin() {
        for _ in 0..200 {
            let (p_bits, q_bits) = split_widths(64);
            assert!((29..=35).contains(&p_bits), "p width {p_bits}");
            assert_eq!(p_bits + q_bits, 64);
        }
        for _ in 0..200 {
            let (p_bits, q_bits) = split_widths(32);
            assert!((14..=18).contains(&p_bits), "p width {p_bits}");
            assert_eq!(p_bits + q_bits, 32);
        }
    }

    #[test]
    fn test_key_generation() {
        let pair = generate(64, &KeygenConfig::default()).unwrap();

        let bits = pair.public.bit_length();
        assert!(bits == 63 || bits == 64, "modulus has {bits} bits");
        assert_eq!(pair.public.e, BigUint::from(65_537u64));
        assert_eq!(pair.public.n, pair.private.n);
    }

    #[test]
    fn test_key_encrypt_decrypt() {
        let pair = generate(64, &KeygenConfig::default()).unwrap();
        let message = b"hi";

        let cipher = transform::encrypt(message, &pair.public.e, &pair.public.n).unwrap();
        let decrypted = transform::decrypt(&cipher, &pair.private.d, &pair.private.n);

        assert_eq!(message.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_custom_public_exponent() {
        // e = 3 fails often on gcd(e, φ(n)); a deep attempt budget keeps
        // this deterministic in practice
        let config = KeygenConfig::default()
            .with_public_exponent(3)
            .with_max_attempts(64);
        let pair = generate(64, &config).unwrap();
        assert_eq!(pair.public.e, BigUint::from(3u8));

        let cipher = transform::encrypt(b"ok", &pair.public.e, &pair.public.n).unwrap();
        assert_eq!(
            transform::decrypt(&cipher, &pair.private.d, &pair.private.n),
            b"ok"
        );
    }

    #[test]
    fn test_rejects_bad_sizes_and_exponents() {
        let config = KeygenConfig::default();
        for bits in [0, 24, 31, 63] {
            assert!(
                matches!(
                    generate(bits, &config),
                    Err(KeyError::InvalidParameter(_))
                ),
                "{bits} accepted"
            );
        }

        let even = KeygenConfig::default().with_public_exponent(4);
        assert!(matches!(
            generate(64, &even),
            Err(KeyError::InvalidParameter(_))
        ));

        let tiny = KeygenConfig::default().with_public_exponent(1);
        assert!(matches!(
            generate(64, &tiny),
            Err(KeyError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_zero_attempts_fail_cleanly() {
        let config = KeygenConfig::default().with_max_attempts(0);
        let err = generate(64, &config).unwrap_err();
        assert!(matches!(
            err,
            KeyError::KeyGenerationFailure { attempts: 0 }
        ));
    }

    #[test]
    fn test_blob_round_trip() {
        let pair = generate(64, &KeygenConfig::default()).unwrap();

        let public = PublicKey::from_blob(&pair.public.to_blob()).unwrap();
        assert_eq!(public, pair.public);

        let private = PrivateKey::from_blob(&pair.private.to_blob()).unwrap();
        assert_eq!(private, pair.private);
    }
}
