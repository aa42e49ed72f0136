//! REPL, CLI support and publisher files for zmanim.
//!
//! This crate provides:
//! - [`Repl`] - Interactive formula evaluation with `@key` definitions
//! - [`PublisherFile`] - A locality, formula set and event calendar in TOML
//! - [`render_day`], [`render_range`] and [`render_preview`] - Text and JSON output
//! - [`logging`] - The stderr log subscriber used by the `zmanim` binary

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod editor;
pub mod highlight;
pub mod logging;
pub mod output;
pub mod publisher_file;
pub mod repl;

pub use editor::{LineEditor, ReadResult, RustylineEditor};
pub use highlight::FormulaHighlighter;
pub use output::{
    OutputFormat, render_day, render_issues, render_preview, render_range, to_json,
};
pub use publisher_file::{LocalitySection, PublisherFile, PublisherSection, ZmanSection};
pub use repl::{Repl, Reply};
