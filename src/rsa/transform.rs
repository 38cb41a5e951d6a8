// Raw RSA Transform
// Textbook modular exponentiation over message bytes, no padding

use num_bigint::BigUint;

use super::error::KeyError;

/// Encrypt plaintext bytes under a public key (e, n).
///
/// The plaintext is read as one big-endian integer m, which must satisfy
/// m < n; anything larger surfaces [`KeyError::PlaintextOverflow`]. No
/// padding is applied, so equal plaintexts produce equal ciphertexts.
pub fn encrypt(plaintext: &[u8], e: &BigUint, n: &BigUint) -> Result<BigUint, KeyError> {
    let m = BigUint::from_bytes_be(plaintext);
    if &m >= n {
        return Err(KeyError::PlaintextOverflow {
            plaintext_bits: m.bits(),
            modulus_bits: n.bits(),
        });
    }
    Ok(m.modpow(e, n))
}

/// Decrypt a ciphertext value under a private key (d, n), returning the
/// minimal big-endian plaintext bytes. The modulus must be nonzero; any
/// ciphertext of a well-formed key pair reduces below it.
pub fn decrypt(ciphertext: &BigUint, d: &BigUint, n: &BigUint) -> Vec<u8> {
    ciphertext.modpow(d, n).to_bytes_be()
}
