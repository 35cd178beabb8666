//! Tonekit - PNG/PNM processing from the command line
//!
//! Loads images into a gamma-aware cache, renders color-mode views and
//! runs dithering, auto-leveling and annotation over them. The codecs and
//! image math live in the `tone_engine` crate; this library exposes the
//! configuration, file formats and pipeline for integration testing.

pub mod error;
pub mod formats;
pub mod models;
pub mod services;
