//! Model pricing tables and cost calculation.
//!
//! Prices are USD per million tokens. Lookup is exact-match first, then
//! prefix/pattern matching. Models outside the registry have no pricing;
//! their spend is recorded as zero with a warning.

use folio_core::chat::TokenUsage;
use tracing::warn;

/// Per-million-token pricing for a model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PricingTier {
    /// USD per million input tokens.
    pub input_per_million: f64,
    /// USD per million output tokens.
    pub output_per_million: f64,
}

/// Rough chars-per-token ratio used for pre-request estimates.
const CHARS_PER_TOKEN: u64 = 4;

/// Look up the pricing tier for a model identifier.
///
/// `None` for models outside the registry.
#[must_use]
pub fn get_pricing_tier(model: &str) -> Option<PricingTier> {
    exact_match(model).or_else(|| pattern_match(model))
}

/// Calculate the USD cost of a request.
#[must_use]
pub fn calculate_cost(model: &str, usage: TokenUsage) -> f64 {
    let Some(t) = get_pricing_tier(model) else {
        warn!(model, "model has no pricing, recording zero cost");
        return 0.0;
    };
    let input = usage.input_tokens as f64 / 1_000_000.0 * t.input_per_million;
    let output = usage.output_tokens as f64 / 1_000_000.0 * t.output_per_million;
    input + output
}

/// Calculate the USD cost of embedding `tokens` input tokens.
#[must_use]
pub fn embedding_cost(model: &str, tokens: u64) -> f64 {
    let Some(t) = get_pricing_tier(model) else {
        warn!(model, "embedding model has no pricing, recording zero cost");
        return 0.0;
    };
    tokens as f64 / 1_000_000.0 * t.input_per_million
}

/// Worst-case USD cost of a completion, estimated before it is sent.
///
/// Input tokens come from a chars-per-token heuristic over the prompt;
/// the output is assumed to run to `max_output_tokens`.
#[must_use]
pub fn estimate_cost(model: &str, prompt_chars: usize, max_output_tokens: u32) -> f64 {
    let Some(t) = get_pricing_tier(model) else {
        return 0.0;
    };
    let input_tokens = (prompt_chars as u64).div_ceil(CHARS_PER_TOKEN);
    input_tokens as f64 / 1_000_000.0 * t.input_per_million
        + f64::from(max_output_tokens) / 1_000_000.0 * t.output_per_million
}

/// Format a cost value for display.
///
/// Uses 4 decimal places for values under $0.01, 2 otherwise.
#[must_use]
pub fn format_cost(cost: f64) -> String {
    if cost < 0.01 {
        format!("${cost:.4}")
    } else {
        format!("${cost:.2}")
    }
}

fn tier(input: f64, output: f64) -> PricingTier {
    PricingTier {
        input_per_million: input,
        output_per_million: output,
    }
}

/// Exact model name matching.
fn exact_match(model: &str) -> Option<PricingTier> {
    Some(match model {
        "gpt-4o" | "gpt-4o-2024-08-06" => tier(2.50, 10.0),
        "gpt-4o-mini" | "gpt-4o-mini-2024-07-18" => tier(0.15, 0.60),
        "gpt-4.1" | "gpt-4.1-2025-04-14" => tier(2.0, 8.0),
        "gpt-4.1-mini" | "gpt-4.1-mini-2025-04-14" => tier(0.40, 1.60),
        "gpt-4.1-nano" | "gpt-4.1-nano-2025-04-14" => tier(0.10, 0.40),
        "o4-mini" | "o4-mini-2025-04-16" => tier(1.10, 4.40),
        "text-embedding-3-small" => tier(0.02, 0.0),
        "text-embedding-3-large" => tier(0.13, 0.0),
        _ => return None,
    })
}

/// Prefix/pattern-based matching for model families.
fn pattern_match(model: &str) -> Option<PricingTier> {
    let m = model.to_lowercase();

    if m.contains("embedding") {
        return Some(tier(0.02, 0.0));
    }
    if m.contains("gpt-4o-mini") {
        return Some(tier(0.15, 0.60));
    }
    if m.contains("gpt-4o") {
        return Some(tier(2.50, 10.0));
    }
    if m.contains("gpt-4.1-nano") {
        return Some(tier(0.10, 0.40));
    }
    if m.contains("gpt-4.1-mini") {
        return Some(tier(0.40, 1.60));
    }
    if m.contains("gpt-4.1") {
        return Some(tier(2.0, 8.0));
    }
    if m.starts_with("o4") {
        return Some(tier(1.10, 4.40));
    }

    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
