//! Compatibility scoring over two birth charts. Pure and deterministic —
//! the jitter terms are seeded off the date and the two charts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use saju_pillars::luck::{is_clash, is_combine};
use saju_pillars::strength::element_counts;
use saju_pillars::tables::{element_relation, ElementRelation};
use saju_pillars::types::Pillars;

use crate::seed::{clamp, Lcg};

pub const AXES: [&str; 5] = ["감정 교류", "대화 궁합", "금전 궁합", "끌림", "장기 전망"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatReport {
    /// Day-master element relation score, 55..=90.
    pub element_score: i32,
    pub element_desc: String,
    /// Branch harmony score: 70 + 8·combines − 12·clashes, 20..=100.
    pub harmony_score: i32,
    pub combine_count: u32,
    pub clash_count: u32,
    /// Element complement score.
    pub complement_score: i32,
    /// Weighted overall, 40..=95.
    pub overall: i32,
    /// (axis label, score) pairs — emotion/communication/money/attraction/long-term.
    pub axes: Vec<(String, i32)>,
    pub my_chart: String,
    pub partner_chart: String,
}

fn element_base(rel: ElementRelation) -> (i32, &'static str) {
    match rel {
        ElementRelation::GeneratesMe => (88, "상대가 나를 북돋아 주는 상생의 관계"),
        ElementRelation::IGenerate => (84, "내가 상대를 채워 주는 헌신형 관계"),
        ElementRelation::Same => (74, "서로를 거울처럼 이해하는 동질적 관계"),
        ElementRelation::IControl => (64, "내가 주도권을 쥐기 쉬운 긴장형 관계"),
        ElementRelation::ControlsMe => (57, "상대의 영향력이 큰 자극적인 관계"),
    }
}

/// The eight day-branch-centred pairs: my day branch against the partner's
/// four branches, and the partner's day branch against mine.
fn harmony_counts(me: &Pillars, partner: &Pillars) -> (u32, u32) {
    let mut combines = 0u32;
    let mut clashes = 0u32;
    let my_day = me.day.branch;
    let partner_day = partner.day.branch;
    for (_, p) in partner.positions() {
        if is_combine(my_day, p.branch) {
            combines += 1;
        }
        if is_clash(my_day, p.branch) {
            clashes += 1;
        }
    }
    for (_, p) in me.positions() {
        if is_combine(partner_day, p.branch) {
            combines += 1;
        }
        if is_clash(partner_day, p.branch) {
            clashes += 1;
        }
    }
    (combines, clashes)
}

/// Count elements one chart lacks that the other supplies.
fn complement_count(me: &Pillars, partner: &Pillars) -> u32 {
    let a = element_counts(me);
    let b = element_counts(partner);
    let mut n = 0u32;
    for i in 0..5 {
        if (a[i] == 0 && b[i] > 0) || (b[i] == 0 && a[i] > 0) {
            n += 1;
        }
    }
    n
}

fn chart_seed(p: &Pillars) -> u64 {
    let mut s = 0u64;
    for (_, pillar) in p.positions() {
        s = s * 120 + (pillar.stem as u64) * 12 + pillar.branch as u64;
    }
    s
}

pub fn analyze(me: &Pillars, partner: &Pillars, date: NaiveDate) -> CompatReport {
    let (element_score, desc) = element_base(element_relation(
        me.day_master_element(),
        partner.day_master_element(),
    ));
    let element_score = clamp(element_score, 55, 90);

    let (combines, clashes) = harmony_counts(me, partner);
    let harmony_score = clamp(70 + 8 * combines as i32 - 12 * clashes as i32, 20, 100);

    let complements = complement_count(me, partner);
    let complement_score = clamp(55 + 9 * complements as i32, 40, 95);

    let days = date.num_days_from_ce() as u64;
    let mut lcg = Lcg::new(days ^ chart_seed(me).rotate_left(17) ^ chart_seed(partner));

    let jitter_term = lcg.in_range(40, 95);
    let overall = clamp(
        (35 * element_score + 25 * harmony_score + 25 * complement_score + 15 * jitter_term) / 100,
        40,
        95,
    );

    let axes = AXES
        .iter()
        .map(|&name| (name.to_string(), clamp(overall + lcg.jitter(10), 30, 100)))
        .collect();

    CompatReport {
        element_score,
        element_desc: desc.to_string(),
        harmony_score,
        combine_count: combines,
        clash_count: clashes,
        complement_score,
        overall,
        axes,
        my_chart: me.chart_line(),
        partner_chart: partner.chart_line(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::types::{BirthInfo, Gender};
    use saju_pillars::engine::compute_pillars;

    fn chart(y: i32, m: u32, d: u32, h: u32, g: Gender) -> Pillars {
        compute_pillars(&BirthInfo {
            year: y,
            month: m,
            day: d,
            hour: h,
            minute: 0,
            gender: g,
        })
        .unwrap()
    }

    #[test]
    fn deterministic_for_same_inputs() {
        let a = chart(1994, 10, 3, 19, Gender::F);
        let b = chart(1995, 3, 15, 14, Gender::M);
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let r1 = analyze(&a, &b, date);
        let r2 = analyze(&a, &b, date);
        assert_eq!(r1.overall, r2.overall);
        assert_eq!(r1.axes, r2.axes);
    }

    #[test]
    fn scores_stay_in_bounds() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        for (y1, y2) in [(1950, 2001), (1984, 1984), (1999, 1960), (2020, 1931)] {
            let a = chart(y1, 1, 15, 3, Gender::M);
            let b = chart(y2, 7, 20, 22, Gender::F);
            let r = analyze(&a, &b, date);
            assert!((55..=90).contains(&r.element_score));
            assert!((20..=100).contains(&r.harmony_score));
            assert!((40..=95).contains(&r.overall));
            assert_eq!(r.axes.len(), 5);
            for (_, s) in &r.axes {
                assert!((30..=100).contains(s));
            }
        }
    }

    #[test]
    fn harmony_counts_eight_pairs_max() {
        let a = chart(1994, 10, 3, 19, Gender::F);
        let b = chart(1995, 3, 15, 14, Gender::M);
        let (combines, clashes) = harmony_counts(&a, &b);
        assert!(combines + clashes <= 8);
    }
}
