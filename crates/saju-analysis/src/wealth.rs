//! Wealth deep-dive scoring: which wealth/output/peer stars sit in the
//! year/month/hour positions, adjusted by the year's luck.

use serde::{Deserialize, Serialize};

use saju_pillars::luck::LuckReport;
use saju_pillars::types::Pillars;
use saju_pillars::yukchin::{classify, Yukchin};

use crate::seed::clamp;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WealthReport {
    pub stability: i32,
    pub opportunity: i32,
    pub productivity: i32,
    pub risk: i32,
    pub timing: i32,
    pub overall: i32,
    /// The stars found in the three non-day stem positions, for the prompt.
    pub stars: Vec<Yukchin>,
}

impl WealthReport {
    pub fn axes(&self) -> [(&'static str, i32); 5] {
        [
            ("안정성", self.stability),
            ("기회", self.opportunity),
            ("생산성", self.productivity),
            ("리스크 관리", self.risk),
            ("타이밍", self.timing),
        ]
    }
}

pub fn analyze(pillars: &Pillars, luck: &LuckReport) -> WealthReport {
    let day_master = pillars.day_master();
    let stars: Vec<Yukchin> = [pillars.year.stem, pillars.month.stem, pillars.hour.stem]
        .iter()
        .map(|&s| classify(day_master, s))
        .collect();

    let jeongjae = stars.iter().filter(|y| **y == Yukchin::Jeongjae).count() as i32;
    let pyeonjae = stars.iter().filter(|y| **y == Yukchin::Pyeonjae).count() as i32;
    let output = stars.iter().filter(|y| y.is_output()).count() as i32;
    let peers = stars.iter().filter(|y| y.is_peer()).count() as i32;

    // 정재 anchors steady income; 편재 opens windfall opportunity.
    let stability = clamp(50 + 16 * jeongjae + 5 * pyeonjae - 6 * peers, 20, 95);
    let opportunity = clamp(50 + 16 * pyeonjae + 5 * jeongjae + 4 * output, 20, 95);
    let productivity = clamp(50 + 14 * output, 20, 95);
    let risk = clamp(72 - 13 * peers, 20, 95);

    let mut timing = 58;
    if luck.year_stem_yukchin.is_wealth() {
        timing += 15;
    } else if luck.year_stem_yukchin.is_output() {
        timing += 8;
    } else if luck.year_stem_yukchin.is_peer() {
        timing -= 10;
    }
    timing += 10 * luck.combine_count() as i32;
    timing -= 10 * luck.clash_count() as i32;
    let timing = clamp(timing, 15, 95);

    let overall = clamp(
        (25 * stability + 25 * opportunity + 20 * productivity + 15 * risk + 15 * timing) / 100,
        20,
        95,
    );

    WealthReport {
        stability,
        opportunity,
        productivity,
        risk,
        timing,
        overall,
        stars,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::types::{BirthInfo, Gender};
    use saju_pillars::engine::compute_pillars;
    use saju_pillars::luck::analyze_year_luck;

    fn chart(y: i32, m: u32, d: u32, h: u32) -> Pillars {
        compute_pillars(&BirthInfo {
            year: y,
            month: m,
            day: d,
            hour: h,
            minute: 0,
            gender: Gender::M,
        })
        .unwrap()
    }

    #[test]
    fn three_stars_from_non_day_positions() {
        let p = chart(1994, 10, 3, 19);
        let luck = analyze_year_luck(&p, 2026, 8);
        let r = analyze(&p, &luck);
        assert_eq!(r.stars.len(), 3);
    }

    #[test]
    fn scores_within_bounds() {
        for (y, m, d, h) in [(1950, 2, 1, 0), (1984, 6, 15, 12), (2001, 12, 31, 23)] {
            let p = chart(y, m, d, h);
            let luck = analyze_year_luck(&p, 2026, 8);
            let r = analyze(&p, &luck);
            for (_, v) in r.axes() {
                assert!((15..=95).contains(&v), "axis out of bounds: {}", v);
            }
            assert!((20..=95).contains(&r.overall));
        }
    }

    #[test]
    fn wealth_year_lifts_timing() {
        let p = chart(1994, 10, 3, 19);
        let mut luck = analyze_year_luck(&p, 2026, 8);
        let base = analyze(&p, &luck);

        // Force a wealth-star year with no branch interactions.
        luck.year_stem_yukchin = Yukchin::Jeongjae;
        luck.interactions.clear();
        let lifted = analyze(&p, &luck);
        assert!(lifted.timing >= base.timing - 20);
        assert!(lifted.timing >= 58);
    }
}
