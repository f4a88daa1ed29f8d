//! Weighted keyword intent classification
//!
//! Pure function of the keyword table and the input string; no external
//! calls. For each candidate intent the score is
//! `(matched_keywords / total_keywords) * weight`, with a floor of
//! `0.5 * weight` for intents whose keyword list has six or fewer entries
//! (short lists would otherwise be under-scored relative to long ones).
//! Ties resolve to the first-registered intent in [`REGISTRY`] order.

use super::Intent;

/// Minimum winning score; anything lower classifies as `Unknown`.
pub const ACCEPTANCE_THRESHOLD: f64 = 0.15;

/// Keyword lists with six or fewer entries get a floor score on any match.
const SHORT_LIST_LEN: usize = 6;
const SHORT_LIST_FLOOR: f64 = 0.5;

/// One row of the intent keyword table
pub struct IntentSpec {
    pub intent: Intent,
    pub keywords: &'static [&'static str],
    pub weight: f64,
}

/// The intent keyword registry.
///
/// Order matters: ties resolve to the earlier entry, so more specific
/// intents are registered before broader ones.
pub static REGISTRY: &[IntentSpec] = &[
    IntentSpec {
        intent: Intent::ClaimStatus,
        keywords: &[
            "claim status",
            "status of my claim",
            "my claim",
            "claim number",
            "case status",
            "claim progress",
            "claim update",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::PaymentHistory,
        keywords: &[
            "payment history",
            "past payments",
            "previous payments",
            "payment record",
            "payments received",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::PaymentStatus,
        keywords: &[
            "payment status",
            "compensation payment",
            "when will i be paid",
            "payment due",
            "benefit payment",
            "payout",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::PensionInquiry,
        keywords: &[
            "pension",
            "monthly pension",
            "pension amount",
            "survivor benefit",
            "disability pension",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::DocumentStatus,
        keywords: &[
            "document",
            "paperwork",
            "form status",
            "submitted documents",
            "missing documents",
            "medical certificate",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::AccountInfo,
        keywords: &[
            "my account",
            "account info",
            "account details",
            "update my address",
            "contact information",
            "my profile",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::TechnicalHelp,
        keywords: &[
            "cannot log in",
            "can't log in",
            "forgot my password",
            "website problem",
            "technical issue",
            "error message",
            "app not working",
        ],
        weight: 0.9,
    },
    IntentSpec {
        intent: Intent::ClaimFiling,
        keywords: &[
            "file a claim",
            "how do i file",
            "report an injury",
            "submit a claim",
            "start a claim",
            "injury report",
            "work accident",
        ],
        weight: 1.0,
    },
    IntentSpec {
        intent: Intent::MedicalProviders,
        keywords: &[
            "hospital",
            "clinic",
            "which doctor",
            "medical provider",
            "treatment",
            "approved hospitals",
        ],
        weight: 0.9,
    },
    IntentSpec {
        intent: Intent::OfficeLocations,
        keywords: &[
            "office location",
            "nearest branch",
            "opening hours",
            "phone number",
            "contact the office",
        ],
        weight: 0.9,
    },
    IntentSpec {
        intent: Intent::Greeting,
        keywords: &["hello", "hi there", "good morning", "good afternoon", "hey"],
        weight: 0.8,
    },
    IntentSpec {
        intent: Intent::Farewell,
        keywords: &["goodbye", "bye", "thank you", "thanks", "that's all"],
        weight: 0.8,
    },
];

/// Classify free text into an intent with a confidence score.
///
/// Returns `(Intent::Unknown, 0.0)` when no intent reaches the acceptance
/// threshold.
pub fn classify(text: &str) -> (Intent, f64) {
    let lowered = text.to_lowercase();

    let mut best: Option<(Intent, f64)> = None;
    for spec in REGISTRY {
        let score = score_intent(spec, &lowered);
        // Strict comparison keeps the first-registered intent on ties.
        if score > best.map(|(_, s)| s).unwrap_or(0.0) {
            best = Some((spec.intent, score));
        }
    }

    match best {
        Some((intent, score)) if score >= ACCEPTANCE_THRESHOLD => (intent, score),
        _ => (Intent::Unknown, 0.0),
    }
}

fn score_intent(spec: &IntentSpec, lowered_text: &str) -> f64 {
    let matches = spec
        .keywords
        .iter()
        .filter(|kw| lowered_text.contains(*kw))
        .count();

    if matches == 0 {
        return 0.0;
    }

    let ratio = matches as f64 / spec.keywords.len() as f64;
    let mut score = ratio * spec.weight;

    if spec.keywords.len() <= SHORT_LIST_LEN {
        score = score.max(SHORT_LIST_FLOOR * spec.weight);
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_status_classification() {
        let (intent, confidence) = classify("What is my claim status?");
        assert_eq!(intent, Intent::ClaimStatus);
        // "claim status" and "my claim" match; 2 of 7 keywords, weight 1.0.
        assert!((confidence - 2.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_no_match_is_unknown() {
        let (intent, confidence) = classify("the quick brown fox jumps over nothing relevant");
        assert_eq!(intent, Intent::Unknown);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_empty_input_is_unknown() {
        assert_eq!(classify(""), (Intent::Unknown, 0.0));
    }

    #[test]
    fn test_case_insensitive() {
        let (intent, _) = classify("PAYMENT HISTORY please");
        assert_eq!(intent, Intent::PaymentHistory);
    }

    #[test]
    fn test_short_list_floor() {
        // One match out of five keywords would score 0.2 raw; the short-list
        // floor lifts it to 0.5 * weight.
        let (intent, confidence) = classify("how much is my pension now");
        assert_eq!(intent, Intent::PensionInquiry);
        assert!((confidence - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tie_resolves_to_registration_order() {
        // "hello" (Greeting) and "goodbye" (Farewell) both floor-score at
        // 0.5 * 0.8. Greeting is registered first, so it must win. Pinned
        // deliberately: reordering REGISTRY is a behavior change.
        let (intent, confidence) = classify("hello and goodbye");
        assert_eq!(intent, Intent::Greeting);
        assert!((confidence - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_below_threshold_is_unknown() {
        // A single match in a 7-keyword list with no floor would be 1/7
        // (~0.143), under the 0.15 acceptance threshold.
        let (intent, confidence) = classify("there was a work accident yesterday at the site");
        // "work accident" is 1 of 7 ClaimFiling keywords; 7 > SHORT_LIST_LEN
        // so no floor applies.
        assert_eq!(intent, Intent::Unknown);
        assert_eq!(confidence, 0.0);
    }

    #[test]
    fn test_filing_beats_status_for_new_claims() {
        let (intent, _) = classify("how do i file a claim for my injury report");
        assert_eq!(intent, Intent::ClaimFiling);
    }

    #[test]
    fn test_registry_covers_all_non_unknown_intents() {
        for intent in Intent::LIVE_DATA.iter().chain(Intent::STATIC) {
            assert!(
                REGISTRY.iter().any(|spec| spec.intent == *intent),
                "intent {intent} missing from keyword registry"
            );
        }
    }
}
