// Credential helpers: password hashing and random key material

pub mod password;
pub mod random;
