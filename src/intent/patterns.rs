//! Keyword families used by the classifier. Queries are lowercased before
//! matching, so the patterns are written in lowercase.

use regex::RegexSet;
use std::sync::LazyLock;

/// Channels needing attention. Checked before the general health family.
pub static UNHEALTHY: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\bunhealthy\b",
        r"\bnot\s+healthy\b",
        r"\b(problem|problematic|troubled|failing|broken|stuck)\b.*\bchannels?\b",
        r"\bchannels?\b.*\b(problems?|issues?|trouble)\b",
        r"\bneed(s|ing)?\s+(attention|rebalanc\w*)",
    ])
    .unwrap()
});

pub static HEALTH: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\bhealth(y)?\b",
        r"\bstatus\b",
        r"\bhow\s+(are|is)\s+(my\s+)?(channels?|node)\b",
        r"\bperform(ing|ance)\b",
    ])
    .unwrap()
});

pub static LIQUIDITY: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"\bliquidity\b",
        r"balanc",
        r"\bcapacit(y|ies)\b",
        r"\bfund(s|ed|ing)?\b",
        r"\b(inbound|outbound)\b",
    ])
    .unwrap()
});
