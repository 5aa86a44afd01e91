pub mod grease;
pub mod ja3;
pub mod types;

pub use ja3::{compute_ja3, ja3_hash};
pub use types::Ja3Result;
