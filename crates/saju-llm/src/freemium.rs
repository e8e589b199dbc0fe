//! `[FREE]…[/FREE][PREMIUM]…[/PREMIUM]` extraction from paid-track replies.
//! Tolerant: missing tags mean the whole reply is free.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static FREE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[FREE\]\s*(.*?)\s*\[/FREE\]").expect("free tag regex")
});

static PREMIUM_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\[PREMIUM\]\s*(.*?)\s*\[/PREMIUM\]").expect("premium tag regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitReply {
    pub free_text: String,
    pub premium_text: String,
    pub has_premium: bool,
}

pub fn split_reply(raw: &str) -> SplitReply {
    let free = FREE_RE.captures(raw).map(|c| c[1].to_string());
    let premium = PREMIUM_RE.captures(raw).map(|c| c[1].to_string());

    match (free, premium) {
        (Some(f), Some(p)) if !p.is_empty() => SplitReply {
            free_text: f,
            premium_text: p,
            has_premium: true,
        },
        (Some(f), _) => SplitReply {
            free_text: f,
            premium_text: String::new(),
            has_premium: false,
        },
        // No tags at all — treat everything as free.
        (None, _) => SplitReply {
            free_text: raw.trim().to_string(),
            premium_text: String::new(),
            has_premium: false,
        },
    }
}

/// Replace each character run with blocks for the blurred premium preview.
pub fn blur(text: &str, max_blocks: usize) -> String {
    let mut out = String::new();
    let mut blocks = 0usize;
    for ch in text.chars() {
        if blocks >= max_blocks {
            break;
        }
        if ch.is_whitespace() {
            out.push(ch);
        } else {
            out.push('█');
            blocks += 1;
        }
    }
    out
}
