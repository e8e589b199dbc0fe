//! Intent and message-class detection over the raw utterance. Pending
//! actions are resolved before any of this runs — the router owns that order.

use std::sync::LazyLock;

use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Compatibility,
    WealthDeepDive,
    AuspiciousDate,
    DailyFortune,
}

static COMPAT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"궁합|잘\s*맞|어울리").expect("compat regex"));

static WEALTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(재물|금전|돈)\s*운|부자\s*될|재테크\s*운").expect("wealth regex")
});

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"택일|길일|좋은\s*날|날짜\s*(좀|잡|추천)|언제가\s*좋").expect("date regex")
});

static DAILY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"오늘\s*(의)?\s*운세|오늘\s*운").expect("daily regex"));

/// First matching intent in priority order, or None for general handling.
pub fn detect_intent(text: &str) -> Option<Intent> {
    if COMPAT_RE.is_match(text) {
        Some(Intent::Compatibility)
    } else if DAILY_RE.is_match(text) {
        Some(Intent::DailyFortune)
    } else if WEALTH_RE.is_match(text) {
        Some(Intent::WealthDeepDive)
    } else if DATE_RE.is_match(text) {
        Some(Intent::AuspiciousDate)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    SajuQuestion,
    CasualChat,
    MetaAboutAi,
    Harmful,
    Greeting,
}

const HARMFUL_KEYWORDS: [&str; 6] = [
    "자살", "죽고 싶", "죽고싶", "자해", "목숨을 끊", "죽어버리",
];

const GREETING_KEYWORDS: [&str; 5] = ["안녕", "하이", "반가워", "헬로", "처음이야"];

const META_KEYWORDS: [&str; 6] = [
    "너 누구", "누가 만들", "무슨 봇", "뭘 할 수", "ai야", "사람이야",
];

static SAJU_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"운세|사주|운이|운은|운\s*어때|올해|내년|이번\s*달|언제|시기|팔자|일주|대운")
        .expect("saju regex")
});

/// Harmful detection is checked by the router before anything else — it wins
/// over every other branch including pending actions.
pub fn is_harmful(text: &str) -> bool {
    HARMFUL_KEYWORDS.iter().any(|kw| text.contains(kw))
}

pub fn classify_message(text: &str) -> MessageClass {
    if is_harmful(text) {
        return MessageClass::Harmful;
    }
    let lowered = text.to_lowercase();
    if META_KEYWORDS.iter().any(|kw| lowered.contains(kw)) {
        return MessageClass::MetaAboutAi;
    }
    if SAJU_RE.is_match(text) {
        return MessageClass::SajuQuestion;
    }
    if GREETING_KEYWORDS.iter().any(|kw| text.contains(kw)) {
        return MessageClass::Greeting;
    }
    MessageClass::CasualChat
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compatibility_intent() {
        assert_eq!(
            detect_intent("1995년 3월 15일 오후 2시 남성이랑 궁합 어때?"),
            Some(Intent::Compatibility)
        );
    }

    #[test]
    fn wealth_intent() {
        assert_eq!(detect_intent("올해 재물운 좀 봐줘"), Some(Intent::WealthDeepDive));
        assert_eq!(detect_intent("나 부자 될 수 있어?"), Some(Intent::WealthDeepDive));
    }

    #[test]
    fn date_intent() {
        assert_eq!(detect_intent("이사 택일 부탁해"), Some(Intent::AuspiciousDate));
        assert_eq!(detect_intent("계약은 언제가 좋아?"), Some(Intent::AuspiciousDate));
    }

    #[test]
    fn daily_intent() {
        assert_eq!(detect_intent("오늘의 운세 알려줘"), Some(Intent::DailyFortune));
        assert_eq!(detect_intent("오늘 운세 어때"), Some(Intent::DailyFortune));
    }

    #[test]
    fn no_intent_for_general_questions() {
        assert_eq!(detect_intent("올해 연애운 어때?"), None);
    }

    #[test]
    fn harmful_wins_classification() {
        assert_eq!(classify_message("죽고 싶다는 생각이 들어"), MessageClass::Harmful);
        assert!(is_harmful("요즘 자해 충동이 있어"));
    }

    #[test]
    fn greeting_and_meta_and_casual() {
        assert_eq!(classify_message("안녕!"), MessageClass::Greeting);
        assert_eq!(classify_message("너 누구야?"), MessageClass::MetaAboutAi);
        assert_eq!(classify_message("점심 뭐 먹지"), MessageClass::CasualChat);
    }

    #[test]
    fn saju_questions_fall_through() {
        assert_eq!(classify_message("올해 연애운 어때?"), MessageClass::SajuQuestion);
        assert_eq!(classify_message("내년에 이직해도 될까? 시기가 궁금해"), MessageClass::SajuQuestion);
    }
}
