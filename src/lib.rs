//! RSA key generation and messaging primitives behind the rsa-messenger CLI.
//!
//! The [`rsa`] module holds the toolkit: Miller-Rabin primality testing, the
//! concurrent prime search, key pair generation, the key blob codec, and the
//! raw (unpadded) transform. [`net`] exchanges JSON records with the shared
//! key server, and [`store`] keeps those records in local key files.

pub mod net;
pub mod rsa;
pub mod store;
