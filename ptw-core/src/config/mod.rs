//! Configuration types
//!
//! Board-agnostic wall configuration. The firmware fills it from the
//! embedded `wall.toml`.

pub mod toml;
pub mod types;

pub use self::toml::{parse_config, ParseError};
pub use types::*;
