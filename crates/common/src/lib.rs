//! Shared value types used across the synthwave crates.

mod types;

pub use types::{Color, ParseColorError, Transform};
