//! Static overlay-detection patterns.
//!
//! Pure data, immutable for the process lifetime. The suppression engine
//! consumes three pattern families: structural selectors removed outright,
//! text heuristics that flag an element by content, and the broader
//! container selectors used to find a removable ancestor of a heuristic hit.

/// Selectors whose every match is removed outright during a sweep.
///
/// The order is immaterial to the outcome but fixed so removal counts are
/// deterministic across runs.
const STRUCTURAL_PATTERNS: &[&str] = &[
    ".player-post-play-recommendations-container",
    "[data-uia=\"interrupt-pane\"]",
    ".watch-video--interstitial-scrim",
    ".nf-modal.interstitial-full-screen",
    ".playback-unified-overlay",
    ".watch-video--evidence-overlay",
    ".evidence-overlay",
    ".billboard-modal",
    ".postplay-rec-overlay",
    ".interstitial",
    "[data-uia=\"postplay-rec-overlay\"]",
    "[data-uia=\"postplay-countdown\"]",
    ".watch-video--overlay-container",
    ".postplay-container",
];

/// Literal substrings of overlay copy. An element carrying one of these in
/// its direct text marks its nearest container-pattern ancestor for removal.
const TEXT_HEURISTICS: &[&str] = &[
    "Are you still watching",
    "Next Episode",
    "Watch Credits",
    "Skip Intro",
    "Continue Watching",
];

/// Broad selectors used only to locate a removable ancestor of a
/// heuristic-matched element, never for direct sweeping.
const CONTAINER_PATTERNS: &[&str] = &[
    "[class*=\"overlay\"]",
    "[class*=\"modal\"]",
    "[class*=\"popup\"]",
];

/// Class-name fragments that make a mutated element overlay-relevant.
/// Substring matched case-insensitively against class tokens, deliberately
/// broad to catch variant class names.
const OVERLAY_KEYWORDS: &[&str] = &[
    "overlay",
    "modal",
    "popup",
    "interstitial",
    "postplay",
    "interrupt",
];

pub fn structural_patterns() -> &'static [&'static str] {
    STRUCTURAL_PATTERNS
}

pub fn text_heuristics() -> &'static [&'static str] {
    TEXT_HEURISTICS
}

pub fn container_patterns() -> &'static [&'static str] {
    CONTAINER_PATTERNS
}

pub fn overlay_keywords() -> &'static [&'static str] {
    OVERLAY_KEYWORDS
}

/// True when a class token carries any overlay keyword.
pub fn token_is_overlay_like(token: &str) -> bool {
    let lowered = token.to_ascii_lowercase();
    OVERLAY_KEYWORDS
        .iter()
        .any(|keyword| lowered.contains(keyword))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_order_is_stable() {
        assert_eq!(
            structural_patterns()[0],
            ".player-post-play-recommendations-container"
        );
        assert_eq!(structural_patterns().len(), 14);
    }

    #[test]
    fn keyword_match_is_case_insensitive_substring() {
        assert!(token_is_overlay_like("PlaybackUnifiedOVERLAY"));
        assert!(token_is_overlay_like("nf-modal"));
        assert!(token_is_overlay_like("postplay-rec"));
        assert!(!token_is_overlay_like("player-controls"));
    }
}
