use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tables::{
    branch_is_yang, parse_branch, parse_stem, stem_is_yang, Element, BRANCHES, BRANCH_ELEMENT,
    STEMS, STEM_ELEMENT,
};

/// One (stem, branch) pair. Indices into the 10-stem / 12-branch cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pillar {
    pub stem: u8,
    pub branch: u8,
}

impl Pillar {
    pub fn new(stem: u8, branch: u8) -> Self {
        debug_assert!(stem < 10 && branch < 12);
        Self { stem, branch }
    }

    /// Parse "갑자" / "甲子" (or mixed script). Normalizes hanja to hangul
    /// indices, so formatting the result always yields hangul.
    pub fn parse(s: &str) -> Option<Self> {
        let mut chars = s.chars();
        let stem_ch = chars.next()?.to_string();
        let branch_ch = chars.next()?.to_string();
        if chars.next().is_some() {
            return None;
        }
        Some(Self {
            stem: parse_stem(&stem_ch)?,
            branch: parse_branch(&branch_ch)?,
        })
    }

    pub fn stem_name(&self) -> &'static str {
        STEMS[self.stem as usize]
    }

    pub fn branch_name(&self) -> &'static str {
        BRANCHES[self.branch as usize]
    }

    pub fn name(&self) -> String {
        format!("{}{}", self.stem_name(), self.branch_name())
    }

    pub fn stem_element(&self) -> Element {
        STEM_ELEMENT[self.stem as usize]
    }

    pub fn branch_element(&self) -> Element {
        BRANCH_ELEMENT[self.branch as usize]
    }

    pub fn stem_is_yang(&self) -> bool {
        stem_is_yang(self.stem)
    }

    pub fn branch_is_yang(&self) -> bool {
        branch_is_yang(self.branch)
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.stem_name(), self.branch_name())
    }
}

/// Which of the four pillars a position refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PillarPosition {
    Year,
    Month,
    Day,
    Hour,
}

impl PillarPosition {
    pub fn korean(&self) -> &'static str {
        match self {
            PillarPosition::Year => "년주",
            PillarPosition::Month => "월주",
            PillarPosition::Day => "일주",
            PillarPosition::Hour => "시주",
        }
    }
}

/// The four pillars of a birth chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pillars {
    pub year: Pillar,
    pub month: Pillar,
    pub day: Pillar,
    pub hour: Pillar,
}

impl Pillars {
    /// The day stem — the subject of every reading.
    pub fn day_master(&self) -> u8 {
        self.day.stem
    }

    pub fn day_master_element(&self) -> Element {
        self.day.stem_element()
    }

    pub fn positions(&self) -> [(PillarPosition, Pillar); 4] {
        [
            (PillarPosition::Year, self.year),
            (PillarPosition::Month, self.month),
            (PillarPosition::Day, self.day),
            (PillarPosition::Hour, self.hour),
        ]
    }

    /// "갑술년 병인월 무진일 경신시" form used in prompts and chart headers.
    pub fn chart_line(&self) -> String {
        format!(
            "{}년 {}월 {}일 {}시",
            self.year.name(),
            self.month.name(),
            self.day.name(),
            self.hour.name()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_hanja() {
        let p = Pillar::parse("甲子").unwrap();
        assert_eq!(p.name(), "갑자");
        // Idempotent: parsing the hangul form yields the same pillar.
        assert_eq!(Pillar::parse("갑자").unwrap(), p);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Pillar::parse("").is_none());
        assert!(Pillar::parse("갑").is_none());
        assert!(Pillar::parse("갑자일").is_none());
        assert!(Pillar::parse("xx").is_none());
    }

    #[test]
    fn element_lookups() {
        let p = Pillar::parse("갑자").unwrap();
        assert_eq!(p.stem_element(), Element::Wood);
        assert_eq!(p.branch_element(), Element::Water);
        assert!(p.stem_is_yang());
    }
}
