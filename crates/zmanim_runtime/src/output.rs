//! Rendering results for the terminal or as JSON.

use std::fmt::Write as _;

use serde::Serialize;
use zmanim_engine::FormulaPreview;
use zmanim_foundation::{CalculatedZman, DayResult, Diagnostic, Error, ErrorKind, Result};
use zmanim_language::{BreakdownStep, ValidationIssue};

/// How results are printed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned plain text.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Serializes any result as pretty JSON.
///
/// # Errors
/// Returns [`ErrorKind::Serialization`] if `value` cannot be serialized.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| Error::new(ErrorKind::Serialization(e.to_string())))
}

/// Renders one day.
///
/// # Errors
/// Returns an error only for JSON output that fails to serialize.
pub fn render_day(day: &DayResult, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(day),
        OutputFormat::Text => Ok(day_text(day)),
    }
}

/// Renders a range of days.
///
/// # Errors
/// Returns an error only for JSON output that fails to serialize.
pub fn render_range(days: &[DayResult], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => to_json(days),
        OutputFormat::Text => Ok(days.iter().map(day_text).collect::<Vec<_>>().join("\n")),
    }
}

/// The JSON shape of a formula preview.
#[derive(Debug, Serialize)]
struct PreviewView<'a> {
    value: String,
    time_exact: Option<&'a str>,
    time_rounded: Option<&'a str>,
    breakdown: &'a [BreakdownStep],
    diagnostic: Option<&'a Diagnostic>,
}

/// Renders a formula preview, with its breakdown when `breakdown` is set.
///
/// # Errors
/// Returns an error only for JSON output that fails to serialize.
pub fn render_preview(
    preview: &FormulaPreview,
    breakdown: bool,
    format: OutputFormat,
) -> Result<String> {
    if format == OutputFormat::Json {
        return to_json(&PreviewView {
            value: preview.value.to_string(),
            time_exact: preview.time_exact.as_deref(),
            time_rounded: preview.time_rounded.as_deref(),
            breakdown: if breakdown { &preview.breakdown } else { &[] },
            diagnostic: preview.diagnostic.as_ref(),
        });
    }

    let mut out = match (&preview.instant, &preview.time_exact) {
        (Some(instant), Some(exact)) => {
            format!("{exact}  ({})", instant.format("%Y-%m-%d %Z"))
        }
        _ => preview.value.to_string(),
    };
    if let Some(diagnostic) = &preview.diagnostic {
        let _ = write!(out, "\n  {diagnostic}");
    }
    if breakdown {
        for step in &preview.breakdown {
            let _ = write!(out, "\n  {} = {}", step.expression, step.value);
        }
    }
    Ok(out)
}

/// Renders static validation findings for one formula.
#[must_use]
pub fn render_issues(key: &str, issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|issue| format!("{key}: {issue}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn day_text(day: &DayResult) -> String {
    let width = day.keys().map(str::len).max().unwrap_or(0).max(4);
    let mut out = format!("{}\n", day.date.format("%A %Y-%m-%d"));
    for zman in &day.zmanim {
        let _ = writeln!(out, "  {:<width$}  {}", zman.key, zman_text(zman));
    }
    out
}

fn zman_text(zman: &CalculatedZman) -> String {
    let mut text = match (&zman.time_exact, &zman.time_rounded) {
        (Some(exact), Some(rounded)) => format!("{rounded}  ({exact})"),
        (Some(exact), None) => exact.clone(),
        _ => "--:--".to_string(),
    };
    if !zman.is_active_today {
        text.push_str("  [inactive]");
    }
    if let Some(diagnostic) = &zman.diagnostic {
        let _ = write!(text, "  {diagnostic}");
    }
    text
}
