//! Loading particle data into trees and persisting whole trees
//!
//! Momentum files are whitespace-separated text with four values per row
//! (E, px, py, pz). Stored trees use bincode over the serde form of
//! [`Tree`].

mod error;

pub mod dat;
pub mod store;

pub use dat::{load_dat_file, DatElement, DatLayout, DatReaderOptions};
pub use error::{Error, Result};
pub use store::{load_data, save_data};

// Re-export core types
pub use pwa_data_core::{Key, ParticleKey, Tree};
