pub mod crypto;

pub use crypto::{current_timestamp, sha256_digest};
