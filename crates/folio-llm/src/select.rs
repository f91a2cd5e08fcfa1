//! Query complexity classification and model selection.
//!
//! Routine queries go to the cheap model; queries that call for
//! synthesis across sources go to the stronger one. When the spend
//! ledger reports the budget downshift threshold was crossed, the cheap
//! model is used regardless of complexity.

use folio_settings::LlmSettings;

/// Classified complexity of a user query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Complexity {
    /// Short, direct question.
    Routine,
    /// Needs synthesis, comparison, or long-form reasoning.
    Complex,
}

impl Complexity {
    /// Stable string form for logging.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Complex => "complex",
        }
    }
}

/// Keywords that indicate cross-source synthesis or analysis.
const COMPLEX_MARKERS: &[&str] = &[
    "compare",
    "contrast",
    "relationship between",
    "difference between",
    "synthesize",
    "analyze",
    "analyse",
    "evaluate",
    "critique",
    "trace the development",
    "evolution of",
    "reconcile",
    "in what ways",
];

/// Word count above which a query is treated as complex.
const LONG_QUERY_WORDS: usize = 50;

/// Daily budget fraction that must remain for the flagship model.
const FLAGSHIP_HEADROOM: f64 = 0.5;

/// Classify a user query.
///
/// Follow-up turns carry conversation context the model has to weave in,
/// so any query with prior assistant turns is treated as complex.
#[must_use]
pub fn classify(query: &str, prior_assistant_turns: usize) -> Complexity {
    if prior_assistant_turns > 0 {
        return Complexity::Complex;
    }
    let lowered = query.to_lowercase();
    if COMPLEX_MARKERS.iter().any(|m| lowered.contains(m)) {
        return Complexity::Complex;
    }
    if query.split_whitespace().count() > LONG_QUERY_WORDS {
        return Complexity::Complex;
    }
    // Multi-part questions lean complex.
    if query.matches('?').count() >= 3 {
        return Complexity::Complex;
    }
    Complexity::Routine
}

/// Pick the model for a query.
///
/// `downshifted` comes from [`CostLedger::should_downshift`] and wins
/// over complexity; `daily_headroom` from
/// [`CostLedger::daily_headroom`]. The flagship model is used only while
/// more than half the daily budget remains.
///
/// [`CostLedger::should_downshift`]: crate::ledger::CostLedger::should_downshift
/// [`CostLedger::daily_headroom`]: crate::ledger::CostLedger::daily_headroom
#[must_use]
pub fn select_model(
    settings: &LlmSettings,
    complexity: Complexity,
    downshifted: bool,
    daily_headroom: f64,
) -> &str {
    if downshifted || daily_headroom <= FLAGSHIP_HEADROOM {
        return &settings.default_model;
    }
    match complexity {
        Complexity::Routine => &settings.default_model,
        Complexity::Complex => &settings.complex_model,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_question_is_routine() {
        assert_eq!(classify("What is the shadow?", 0), Complexity::Routine);
        assert_eq!(
            classify("Where was this letter written?", 0),
            Complexity::Routine
        );
    }

    #[test]
    fn follow_up_turns_are_complex() {
        assert_eq!(classify("What is the shadow?", 1), Complexity::Complex);
        assert_eq!(classify("And after that?", 4), Complexity::Complex);
    }

    #[test]
    fn marker_keywords_are_complex() {
        assert_eq!(
            classify("Compare the treatment of dreams in the early and late letters", 0),
            Complexity::Complex
        );
        assert_eq!(
            classify("What is the relationship between the two essays?", 0),
            Complexity::Complex
        );
        assert_eq!(
            classify("Trace the development of this idea across the volumes", 0),
            Complexity::Complex
        );
    }

    #[test]
    fn marker_matching_is_case_insensitive() {
        assert_eq!(classify("EVALUATE this argument", 0), Complexity::Complex);
    }

    #[test]
    fn long_query_is_complex() {
        let long = "word ".repeat(60);
        assert_eq!(classify(&long, 0), Complexity::Complex);
    }

    #[test]
    fn many_question_marks_are_complex() {
        assert_eq!(
            classify("Who wrote it? When? And to whom was it addressed?", 0),
            Complexity::Complex
        );
    }

    #[test]
    fn model_selection_follows_complexity() {
        let settings = LlmSettings::default();
        assert_eq!(
            select_model(&settings, Complexity::Routine, false, 1.0),
            settings.default_model
        );
        assert_eq!(
            select_model(&settings, Complexity::Complex, false, 1.0),
            settings.complex_model
        );
    }

    #[test]
    fn downshift_overrides_complexity() {
        let settings = LlmSettings::default();
        assert_eq!(
            select_model(&settings, Complexity::Complex, true, 1.0),
            settings.default_model
        );
    }

    #[test]
    fn flagship_needs_budget_headroom() {
        let settings = LlmSettings::default();
        assert_eq!(
            select_model(&settings, Complexity::Complex, false, 0.4),
            settings.default_model
        );
        assert_eq!(
            select_model(&settings, Complexity::Complex, false, 0.6),
            settings.complex_model
        );
    }
}
