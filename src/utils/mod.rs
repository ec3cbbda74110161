pub mod jwt;
pub mod legacy_hash;
pub mod password;
pub mod telegram;
