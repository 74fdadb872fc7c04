//! Credential protection
//!
//! The AniDB password is kept in a `SecureString` from the moment it is read
//! from configuration until the AUTH datagram is encoded.

pub mod secure_string;

pub use secure_string::SecureString;
