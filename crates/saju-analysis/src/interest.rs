//! Keyword-rule interest classification. Multi-label; `General` only when
//! nothing else matches. Persistence and decay live in saju-store — this
//! module is the pure part.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterestCategory {
    Love,
    Money,
    Career,
    Health,
    Study,
    Family,
    Moving,
    Business,
    General,
}

impl InterestCategory {
    pub fn korean(&self) -> &'static str {
        match self {
            InterestCategory::Love => "연애",
            InterestCategory::Money => "재물",
            InterestCategory::Career => "직장",
            InterestCategory::Health => "건강",
            InterestCategory::Study => "학업",
            InterestCategory::Family => "가족",
            InterestCategory::Moving => "이사",
            InterestCategory::Business => "사업",
            InterestCategory::General => "종합",
        }
    }

    /// First-line emoji required by the push post-rules.
    pub fn emoji(&self) -> &'static str {
        match self {
            InterestCategory::Love => "❤️",
            InterestCategory::Money => "💰",
            InterestCategory::Career => "💼",
            InterestCategory::Health => "🍀",
            InterestCategory::Study => "📚",
            InterestCategory::Family => "🏠",
            InterestCategory::Moving => "🚚",
            InterestCategory::Business => "📈",
            InterestCategory::General => "🔮",
        }
    }

    pub fn all() -> [InterestCategory; 9] {
        [
            InterestCategory::Love,
            InterestCategory::Money,
            InterestCategory::Career,
            InterestCategory::Health,
            InterestCategory::Study,
            InterestCategory::Family,
            InterestCategory::Moving,
            InterestCategory::Business,
            InterestCategory::General,
        ]
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            InterestCategory::Love => &[
                "연애", "사랑", "결혼", "이성", "남친", "여친", "애인", "궁합", "소개팅", "짝사랑",
            ],
            InterestCategory::Money => &[
                "돈", "재물", "재테크", "투자", "주식", "부자", "금전", "로또", "수입", "월급",
            ],
            InterestCategory::Career => &[
                "직장", "취업", "이직", "승진", "회사", "커리어", "직업", "퇴사", "면접",
            ],
            InterestCategory::Health => &["건강", "다이어트", "운동", "수술", "아프", "체력"],
            InterestCategory::Study => &["공부", "시험", "학업", "합격", "수능", "자격증", "성적"],
            InterestCategory::Family => &["가족", "부모", "자녀", "아이", "형제", "육아"],
            InterestCategory::Moving => &["이사", "부동산", "전세", "입주"],
            InterestCategory::Business => &["사업", "창업", "장사", "가게", "매출"],
            InterestCategory::General => &[],
        }
    }
}

impl fmt::Display for InterestCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterestCategory::Love => "love",
            InterestCategory::Money => "money",
            InterestCategory::Career => "career",
            InterestCategory::Health => "health",
            InterestCategory::Study => "study",
            InterestCategory::Family => "family",
            InterestCategory::Moving => "moving",
            InterestCategory::Business => "business",
            InterestCategory::General => "general",
        };
        write!(f, "{}", s)
    }
}

impl std::str::FromStr for InterestCategory {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "love" => Ok(InterestCategory::Love),
            "money" => Ok(InterestCategory::Money),
            "career" => Ok(InterestCategory::Career),
            "health" => Ok(InterestCategory::Health),
            "study" => Ok(InterestCategory::Study),
            "family" => Ok(InterestCategory::Family),
            "moving" => Ok(InterestCategory::Moving),
            "business" => Ok(InterestCategory::Business),
            "general" => Ok(InterestCategory::General),
            other => Err(format!("unknown interest category: {}", other)),
        }
    }
}

/// Scan the utterance for category keywords. Multi-label; falls back to
/// `[General]` when nothing matches.
pub fn classify(text: &str) -> Vec<InterestCategory> {
    let mut matched = Vec::new();
    for cat in InterestCategory::all() {
        if cat == InterestCategory::General {
            continue;
        }
        if cat.keywords().iter().any(|kw| text.contains(kw)) {
            matched.push(cat);
        }
    }
    if matched.is_empty() {
        matched.push(InterestCategory::General);
    }
    matched
}
