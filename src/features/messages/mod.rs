//! # Greeting Messages Feature
//!
//! Randomized, human-sounding greetings for birthdays, anniversaries and check-ins.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false

pub mod generator;

pub use generator::{
    generate, ordinal, Entropy, GenerateOptions, Occasion, RngEntropy, ScriptedEntropy,
};
