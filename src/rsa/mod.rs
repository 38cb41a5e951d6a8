// RSA Module - Main module file
// Exports all RSA-related functionality

pub mod bigint;
pub mod codec;
pub mod error;
pub mod keygen;
pub mod primegen;
pub mod transform;

pub use error::KeyError;
pub use keygen::{generate, KeyPair, KeygenConfig, PrivateKey, PublicKey, DEFAULT_PUBLIC_EXPONENT};
pub use primegen::{search, SearchConfig, DEFAULT_WITNESSES};
pub use transform::{decrypt, encrypt};
