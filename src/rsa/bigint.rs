// RSA Big Integer Operations
// Arithmetic helpers shared by key generation and the raw transform

use num_bigint::{BigInt, BigUint, RandBigInt};
use num_integer::Integer;
use num_traits::{One, Zero};
use rand::rngs::OsRng;

/// Extended Euclidean Algorithm over signed integers
/// Returns (gcd, x, y) such that a*x + b*y = gcd(a, b)
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    if a.is_zero() {
        return (b.clone(), BigInt::zero(), BigInt::one());
    }

    let (gcd, x, y) = extended_gcd(&(b % a), a);
    (gcd, y - (b / a) * &x, x)
}

/// Compute modular inverse: a^(-1) mod m, normalized into [0, m)
/// Returns None if the inverse doesn't exist
pub fn mod_inverse(a: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() || m.is_one() {
        return None;
    }

    let a = BigInt::from(a.clone());
    let m = BigInt::from(m.clone());
    let (gcd, x, _) = extended_gcd(&a, &m);

    if !gcd.is_one() {
        // Inverse doesn't exist
        return None;
    }

    x.mod_floor(&m).to_biguint()
}

/// Miller-Rabin primality test
/// Returns true if value is probably prime after `iterations` rounds.
/// Witness bases are drawn from the operating system CSPRNG.
pub fn is_probable_prime(value: &BigUint, iterations: u32) -> bool {
    let two = BigUint::from(2u8);
    if value < &two {
        return false;
    }
    if value == &two || value == &BigUint::from(3u8) {
        return true;
    }
    if value.is_even() {
        return false;
    }

    // Write value-1 as d * 2^s with d odd
    let n_minus_one = value - 1u8;
    let mut d = n_minus_one.clone();
    let mut s = 0u32;
    while d.is_even() {
        d >>= 1;
        s += 1;
    }

    // Witness loop over bases in [2, value-2]
    let mut rng = OsRng;
    let one = BigUint::one();

    for _ in 0..iterations {
        let a = rng.gen_biguint_range(&two, &n_minus_one);
        let mut x = a.modpow(&d, value);

        if x == one || x == n_minus_one {
            continue;
        }

        let mut witnessed = true;
        for _ in 1..s {
            x = x.modpow(&two, value);
            if x == n_minus_one {
                witnessed = false;
                break;
            }
            if x == one {
                // Nontrivial square root of 1; value is composite
                break;
            }
        }

        if witnessed {
            return false;
        }
    }

    true
}
