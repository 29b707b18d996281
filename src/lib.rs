// Keep main.rs thin and have it call into the library functions.
pub mod actions;
pub mod batch;
pub mod checksum;
pub mod cli;
pub mod coerce;
pub mod config;
pub mod crc32;
pub mod error;
pub mod matrix;
pub mod progress;
pub mod save;
pub mod solver;
pub mod types;
pub mod utils;

pub use coerce::{checksums_match, coerce, coerce_to};
pub use crc32::checksum;
pub use error::{CoercionError, CoercionResult};
pub use types::{ByteBuffer, Checksum, CoercionMode, Correction, PadPosition, PatchWindow};
