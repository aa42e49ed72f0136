//! Zmanim - a formula language for halachic times
//!
//! This crate re-exports all layers of the zmanim system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: zmanim_runtime     - CLI, REPL, publisher files, output
//! Layer 3: zmanim_engine      - Calculation service, ranges, result cache
//! Layer 2: zmanim_language    - Lexer, parser, validation, evaluator
//! Layer 1: zmanim_astro       - Solar events and proportional hours
//! Layer 0: zmanim_foundation  - Core types (Value, Location, Error)
//! ```

pub use zmanim_astro as astro;
pub use zmanim_engine as engine;
pub use zmanim_foundation as foundation;
pub use zmanim_language as language;
pub use zmanim_runtime as runtime;
