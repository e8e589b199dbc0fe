//! Day-master strength scoring and the element distribution header.
//!
//! Scores are kept in integer hundredths (weight tenths × contribution
//! tenths) so the strong/weak thresholds compare exactly.

use serde::{Deserialize, Serialize};

use crate::tables::{element_relation, Element, ElementRelation};
use crate::types::{PillarPosition, Pillars};

/// Position weights in tenths: plain stems/branches 1.0, month stem 1.3,
/// month branch 1.8.
const WEIGHT_STEM: i32 = 10;
const WEIGHT_MONTH_STEM: i32 = 13;
const WEIGHT_BRANCH: i32 = 10;
const WEIGHT_MONTH_BRANCH: i32 = 18;

/// Contribution per element relation, in tenths.
fn contribution(rel: ElementRelation) -> i32 {
    match rel {
        ElementRelation::Same => 10,
        ElementRelation::GeneratesMe => 8,
        ElementRelation::IGenerate => -6,
        ElementRelation::ControlsMe => -10,
        ElementRelation::IControl => -4,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrengthLabel {
    Strong,
    Balanced,
    Weak,
}

impl StrengthLabel {
    pub fn korean(&self) -> &'static str {
        match self {
            StrengthLabel::Strong => "신강",
            StrengthLabel::Balanced => "중화",
            StrengthLabel::Weak => "신약",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Structure {
    /// Strength score in hundredths (200 == 2.0).
    pub score_x100: i32,
    pub label: StrengthLabel,
    /// Count of each element over the eight positions, 목화토금수 order.
    pub element_counts: [u8; 5],
    /// The element that supports a weak day master / drains a strong one.
    pub helpful_element: Element,
}

impl Structure {
    pub fn score(&self) -> f64 {
        self.score_x100 as f64 / 100.0
    }

    /// Five bar lines summing to 8, used as the first-reading header.
    pub fn distribution_lines(&self) -> String {
        let mut out = String::new();
        for (i, el) in Element::all().iter().enumerate() {
            let n = self.element_counts[i];
            out.push_str(el.korean());
            out.push(' ');
            for _ in 0..n {
                out.push('■');
            }
            if n == 0 {
                out.push('·');
            }
            out.push_str(&format!(" {}\n", n));
        }
        out
    }
}

/// Weighted strength sum over the eight positions.
pub fn strength_score_x100(pillars: &Pillars) -> i32 {
    let me = pillars.day_master_element();
    let mut total = 0i32;
    for (pos, p) in pillars.positions() {
        let stem_w = if pos == PillarPosition::Month {
            WEIGHT_MONTH_STEM
        } else {
            WEIGHT_STEM
        };
        let branch_w = if pos == PillarPosition::Month {
            WEIGHT_MONTH_BRANCH
        } else {
            WEIGHT_BRANCH
        };
        total += stem_w * contribution(element_relation(me, p.stem_element()));
        total += branch_w * contribution(element_relation(me, p.branch_element()));
    }
    total
}

pub fn label_for(score_x100: i32) -> StrengthLabel {
    if score_x100 >= 200 {
        StrengthLabel::Strong
    } else if score_x100 <= -200 {
        StrengthLabel::Weak
    } else {
        StrengthLabel::Balanced
    }
}

/// Element counts over the eight positions (four stems + four branches).
pub fn element_counts(pillars: &Pillars) -> [u8; 5] {
    let mut counts = [0u8; 5];
    let idx = |e: Element| Element::all().iter().position(|&x| x == e).unwrap();
    for (_, p) in pillars.positions() {
        counts[idx(p.stem_element())] += 1;
        counts[idx(p.branch_element())] += 1;
    }
    counts
}

/// A weak day master is helped by the element that generates it; a strong one
/// is balanced by the element it generates (drain).
pub fn helpful_element(me: Element, label: StrengthLabel) -> Element {
    match label {
        StrengthLabel::Weak => Element::all()
            .into_iter()
            .find(|e| e.generates() == me)
            .unwrap_or(me),
        StrengthLabel::Strong => me.generates(),
        StrengthLabel::Balanced => me,
    }
}

pub fn analyze_structure(pillars: &Pillars) -> Structure {
    let score_x100 = strength_score_x100(pillars);
    let label = label_for(score_x100);
    Structure {
        score_x100,
        label,
        element_counts: element_counts(pillars),
        helpful_element: helpful_element(pillars.day_master_element(), label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Pillar;

    fn chart(names: [&str; 4]) -> Pillars {
        Pillars {
            year: Pillar::parse(names[0]).unwrap(),
            month: Pillar::parse(names[1]).unwrap(),
            day: Pillar::parse(names[2]).unwrap(),
            hour: Pillar::parse(names[3]).unwrap(),
        }
    }

    #[test]
    fn counts_sum_to_eight() {
        let p = chart(["갑자", "병인", "무진", "경신"]);
        let counts = element_counts(&p);
        assert_eq!(counts.iter().map(|&c| c as u32).sum::<u32>(), 8);
    }

    #[test]
    fn all_same_element_is_strong() {
        // 갑인 everywhere: all wood with a wood day master.
        let p = chart(["갑인", "갑인", "갑인", "갑인"]);
        let s = analyze_structure(&p);
        assert_eq!(s.label, StrengthLabel::Strong);
        // 8 positions, all Same(+1.0): 10*10*6 + 13*10 + 18*10 = 910.
        assert_eq!(s.score_x100, 910);
    }

    #[test]
    fn hostile_chart_is_weak() {
        // Wood day master drowned in metal (controls me).
        let p = chart(["경신", "경신", "갑신", "경신"]);
        let s = analyze_structure(&p);
        assert_eq!(s.label, StrengthLabel::Weak);
    }

    #[test]
    fn same_element_position_never_decreases_score() {
        // Swapping any position's stem to the day-master element must not
        // lower the score: Same contributes the maximum (+1.0).
        let base = chart(["경자", "신축", "갑진", "정사"]);
        let base_score = strength_score_x100(&base);
        for stem in [0u8, 1] {
            // 갑/을 are wood, same element as the 갑 day master.
            let mut p = base;
            p.hour = Pillar::new(stem, base.hour.branch);
            assert!(
                strength_score_x100(&p) >= base_score,
                "stem {} lowered the score",
                stem
            );
        }
    }

    #[test]
    fn distribution_lines_shape() {
        let p = chart(["갑자", "병인", "무진", "경신"]);
        let s = analyze_structure(&p);
        let distribution = s.distribution_lines();
        let lines: Vec<&str> = distribution.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("목"));
        assert!(lines[4].starts_with("수"));
    }

    #[test]
    fn helpful_element_directions() {
        use Element::*;
        assert_eq!(helpful_element(Wood, StrengthLabel::Weak), Water);
        assert_eq!(helpful_element(Wood, StrengthLabel::Strong), Fire);
        assert_eq!(helpful_element(Wood, StrengthLabel::Balanced), Wood);
    }
}
