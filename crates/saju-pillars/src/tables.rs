//! Sexagenary lookup tables. Everything downstream is index arithmetic over
//! these — no floating point, no wall clock.

use serde::{Deserialize, Serialize};

pub const STEMS: [&str; 10] = ["갑", "을", "병", "정", "무", "기", "경", "신", "임", "계"];
pub const BRANCHES: [&str; 12] = [
    "자", "축", "인", "묘", "진", "사", "오", "미", "신", "유", "술", "해",
];

pub const STEM_HANJA: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];
pub const BRANCH_HANJA: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Wood,
    Fire,
    Earth,
    Metal,
    Water,
}

impl Element {
    pub fn korean(&self) -> &'static str {
        match self {
            Element::Wood => "목",
            Element::Fire => "화",
            Element::Earth => "토",
            Element::Metal => "금",
            Element::Water => "수",
        }
    }

    /// All five, in the conventional 목화토금수 order.
    pub fn all() -> [Element; 5] {
        [
            Element::Wood,
            Element::Fire,
            Element::Earth,
            Element::Metal,
            Element::Water,
        ]
    }

    /// The element this one generates (상생): 목→화→토→금→수→목.
    pub fn generates(&self) -> Element {
        match self {
            Element::Wood => Element::Fire,
            Element::Fire => Element::Earth,
            Element::Earth => Element::Metal,
            Element::Metal => Element::Water,
            Element::Water => Element::Wood,
        }
    }

    /// The element this one controls (상극): 목→토, 토→수, 수→화, 화→금, 금→목.
    pub fn controls(&self) -> Element {
        match self {
            Element::Wood => Element::Earth,
            Element::Earth => Element::Water,
            Element::Water => Element::Fire,
            Element::Fire => Element::Metal,
            Element::Metal => Element::Wood,
        }
    }
}

/// How `other` stands relative to `me` in the generating/controlling cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementRelation {
    Same,
    /// `other` generates `me` (인성 방향).
    GeneratesMe,
    /// `me` generates `other` (식상 방향).
    IGenerate,
    /// `other` controls `me` (관성 방향).
    ControlsMe,
    /// `me` controls `other` (재성 방향).
    IControl,
}

pub fn element_relation(me: Element, other: Element) -> ElementRelation {
    if me == other {
        ElementRelation::Same
    } else if other.generates() == me {
        ElementRelation::GeneratesMe
    } else if me.generates() == other {
        ElementRelation::IGenerate
    } else if other.controls() == me {
        ElementRelation::ControlsMe
    } else {
        ElementRelation::IControl
    }
}

pub const STEM_ELEMENT: [Element; 10] = [
    Element::Wood,
    Element::Wood,
    Element::Fire,
    Element::Fire,
    Element::Earth,
    Element::Earth,
    Element::Metal,
    Element::Metal,
    Element::Water,
    Element::Water,
];

pub const BRANCH_ELEMENT: [Element; 12] = [
    Element::Water, // 자
    Element::Earth, // 축
    Element::Wood,  // 인
    Element::Wood,  // 묘
    Element::Earth, // 진
    Element::Fire,  // 사
    Element::Fire,  // 오
    Element::Earth, // 미
    Element::Metal, // 신
    Element::Metal, // 유
    Element::Earth, // 술
    Element::Water, // 해
];

/// Even-indexed symbols are yang, odd are yin.
pub fn stem_is_yang(idx: u8) -> bool {
    idx % 2 == 0
}

pub fn branch_is_yang(idx: u8) -> bool {
    idx % 2 == 0
}

/// Month-stem start offset keyed by year stem (갑/기→병, 을/경→무, 병/신→경,
/// 정/임→임, 무/계→갑). Indexed by `year_stem % 5`.
pub const MONTH_STEM_OFFSET: [u8; 5] = [2, 4, 6, 8, 0];

/// 자시 stem keyed by day stem (갑/기→갑, 을/경→병, 병/신→무, 정/임→경,
/// 무/계→임). Indexed by `day_stem % 5`.
pub const HOUR_STEM_START: [u8; 5] = [0, 2, 4, 6, 8];

/// The n-th of the 60 ganzi names (0 = 갑자, 59 = 계해).
pub fn ganzi_name(n: usize) -> String {
    format!("{}{}", STEMS[n % 10], BRANCHES[n % 12])
}

/// Parse a stem symbol, accepting hangul or hanja. Idempotent over hangul.
pub fn parse_stem(s: &str) -> Option<u8> {
    STEMS
        .iter()
        .position(|&h| h == s)
        .or_else(|| STEM_HANJA.iter().position(|&h| h == s))
        .map(|i| i as u8)
}

/// Parse a branch symbol, accepting hangul or hanja.
pub fn parse_branch(s: &str) -> Option<u8> {
    BRANCHES
        .iter()
        .position(|&h| h == s)
        .or_else(|| BRANCH_HANJA.iter().position(|&h| h == s))
        .map(|i| i as u8)
}
