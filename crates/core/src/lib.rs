//! riffnet: guitar-solo note sequences as transition networks.
//!
//! - `network`: transition graph construction and structural metrics
//! - `corpus`: JAMS extraction, run limiting, transposition augmentation
//! - `midi`: note-on extraction and single-track solo writing
//! - `evaluate`: per-genre averages and generated-vs-original comparison
//! - `config`: genres, directories and preprocessing limits

pub mod config;
pub mod corpus;
pub mod evaluate;
pub mod midi;
pub mod network;
