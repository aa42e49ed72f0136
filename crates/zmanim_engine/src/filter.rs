//! Which formula definitions apply to a calculation.
//!
//! Two independent filters run before evaluation. Flag filtering drops
//! disabled, unpublished and beta definitions unless the request asks for
//! them. Tag filtering compares a definition's event tags with the day's
//! active event codes.

use zmanim_foundation::{ActiveEvents, CalcFlags, FormulaDefinition, FormulaTag, TagKind};

/// Timing tag: match `erev_<event>` instead of the event itself.
pub const DAY_BEFORE: &str = "day_before";

/// Timing tag: match when the event is ending. Upstream supplies these codes.
pub const MOTZEI: &str = "motzei";

/// Returns true if `definition` survives the request flags.
#[must_use]
pub fn passes_flags(definition: &FormulaDefinition, flags: CalcFlags) -> bool {
    (definition.enabled || flags.include_disabled)
        && (definition.published || flags.include_unpublished)
        && (!definition.beta || flags.include_beta)
}

/// Returns true if a definition with `tags` applies on a day with `events`.
///
/// - With no event tags, a definition always applies.
/// - A negated tag whose event is active excludes the definition, and this
///   wins over any positive match.
/// - Otherwise at least one positive tag must match. A `day_before` timing
///   tag makes positive tags match `erev_<tag>` only.
#[must_use]
pub fn should_show(tags: &[FormulaTag], events: &ActiveEvents) -> bool {
    let day_before = tags
        .iter()
        .any(|t| t.kind == TagKind::Timing && t.key == DAY_BEFORE);

    let mut has_positive = false;
    let mut positive_match = false;
    for tag in tags.iter().filter(|t| t.kind.filters()) {
        if tag.negated {
            if events.contains(&tag.key) {
                tracing::trace!(tag = %tag, "negated tag is active");
                return false;
            }
            continue;
        }
        has_positive = true;
        let matched = if day_before {
            events.contains(&format!("erev_{}", tag.key))
        } else {
            events.contains(&tag.key)
        };
        positive_match |= matched;
    }
    !has_positive || positive_match
}
