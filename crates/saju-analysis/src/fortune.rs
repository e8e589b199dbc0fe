//! Daily fortune: today's day pillar against the user's day master. Stable
//! within a KST day yet per-user — seeded by (day-of-month, user stem,
//! today's branch).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use saju_pillars::engine::day_pillar;
use saju_pillars::strength::{analyze_structure, helpful_element};
use saju_pillars::tables::{element_relation, Element, ElementRelation};
use saju_pillars::types::{Pillar, Pillars};

use crate::seed::{clamp, Lcg};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FortuneCategory {
    /// 비화 — same element as the day master.
    Peer,
    /// 인성 — today generates the day master.
    Resource,
    /// 식상 — the day master generates today.
    Output,
    /// 재성 — the day master controls today.
    Wealth,
    /// 관성 — today controls the day master.
    Authority,
    /// 중립 — stem and branch pull in opposite directions.
    Neutral,
}

impl FortuneCategory {
    pub fn korean(&self) -> &'static str {
        match self {
            FortuneCategory::Peer => "비화",
            FortuneCategory::Resource => "인성",
            FortuneCategory::Output => "식상",
            FortuneCategory::Wealth => "재성",
            FortuneCategory::Authority => "관성",
            FortuneCategory::Neutral => "중립",
        }
    }

    fn base_score(&self) -> i32 {
        match self {
            FortuneCategory::Peer => 70,
            FortuneCategory::Resource => 82,
            FortuneCategory::Output => 76,
            FortuneCategory::Wealth => 80,
            FortuneCategory::Authority => 64,
            FortuneCategory::Neutral => 60,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LuckyItems {
    pub color: &'static str,
    pub direction: &'static str,
    pub number: u8,
    pub food: &'static str,
    pub time: &'static str,
}

/// Table-picks keyed by the helpful element.
pub fn lucky_items(element: Element) -> LuckyItems {
    match element {
        Element::Wood => LuckyItems {
            color: "초록색",
            direction: "동쪽",
            number: 3,
            food: "푸른 잎 채소",
            time: "오전 5시~7시",
        },
        Element::Fire => LuckyItems {
            color: "빨간색",
            direction: "남쪽",
            number: 7,
            food: "따뜻한 국물 요리",
            time: "오전 11시~오후 1시",
        },
        Element::Earth => LuckyItems {
            color: "노란색",
            direction: "남서쪽",
            number: 5,
            food: "곡물 요리",
            time: "오후 1시~3시",
        },
        Element::Metal => LuckyItems {
            color: "흰색",
            direction: "서쪽",
            number: 4,
            food: "견과류",
            time: "오후 5시~7시",
        },
        Element::Water => LuckyItems {
            color: "파란색",
            direction: "북쪽",
            number: 1,
            food: "해산물",
            time: "밤 9시~11시",
        },
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FortuneReport {
    pub date: NaiveDate,
    pub today_pillar: Pillar,
    pub category: FortuneCategory,
    pub overall: i32,
    /// 재물 / 연애 / 건강 / 일, in that order.
    pub axes: Vec<(String, i32)>,
    pub lucky: LuckyItems,
}

pub const FORTUNE_AXES: [&str; 4] = ["재물운", "연애운", "건강운", "일운"];

fn categorize(user: &Pillars, today: Pillar) -> FortuneCategory {
    let me = user.day_master_element();
    let stem_rel = element_relation(me, today.stem_element());
    let branch_rel = element_relation(me, today.branch_element());

    // A supportive stem undercut by a controlling branch is a mixed-signal day.
    let supportive = matches!(
        stem_rel,
        ElementRelation::Same | ElementRelation::GeneratesMe
    );
    if supportive && branch_rel == ElementRelation::ControlsMe {
        return FortuneCategory::Neutral;
    }

    match stem_rel {
        ElementRelation::Same => FortuneCategory::Peer,
        ElementRelation::GeneratesMe => FortuneCategory::Resource,
        ElementRelation::IGenerate => FortuneCategory::Output,
        ElementRelation::IControl => FortuneCategory::Wealth,
        ElementRelation::ControlsMe => FortuneCategory::Authority,
    }
}

pub fn analyze(user: &Pillars, date: NaiveDate) -> FortuneReport {
    let today = day_pillar(date);
    let category = categorize(user, today);

    let seed =
        (date.day() as u64) * (user.day_master() as u64 + 1) * (today.branch as u64 + 1);
    let mut lcg = Lcg::new(seed);

    let overall = clamp(category.base_score() + lcg.jitter(8), 40, 98);
    let axes = FORTUNE_AXES
        .iter()
        .map(|&name| (name.to_string(), clamp(overall + lcg.jitter(12), 35, 99)))
        .collect();

    let structure = analyze_structure(user);
    let helper = helpful_element(user.day_master_element(), structure.label);

    FortuneReport {
        date,
        today_pillar: today,
        category,
        overall,
        axes,
        lucky: lucky_items(helper),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::types::{BirthInfo, Gender};
    use saju_pillars::engine::compute_pillars;

    fn chart() -> Pillars {
        compute_pillars(&BirthInfo {
            year: 1994,
            month: 10,
            day: 3,
            hour: 19,
            minute: 0,
            gender: Gender::F,
        })
        .unwrap()
    }

    #[test]
    fn stable_within_a_day() {
        let user = chart();
        let date = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let a = analyze(&user, date);
        let b = analyze(&user, date);
        assert_eq!(a.overall, b.overall);
        assert_eq!(a.axes, b.axes);
        assert_eq!(a.category, b.category);
    }

    #[test]
    fn differs_across_users_or_days() {
        let user = chart();
        let other = compute_pillars(&BirthInfo {
            year: 1987,
            month: 3,
            day: 21,
            hour: 6,
            minute: 0,
            gender: Gender::M,
        })
        .unwrap();
        let d1 = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 8, 2).unwrap();
        let same_user_other_day = analyze(&user, d1).overall != analyze(&user, d2).overall
            || analyze(&user, d1).category != analyze(&user, d2).category;
        let other_user_same_day = analyze(&user, d1).overall != analyze(&other, d1).overall
            || analyze(&user, d1).category != analyze(&other, d1).category
            || analyze(&user, d1).axes != analyze(&other, d1).axes;
        assert!(same_user_other_day || other_user_same_day);
    }

    #[test]
    fn axes_are_four_and_bounded() {
        let r = analyze(&chart(), NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
        assert_eq!(r.axes.len(), 4);
        for (_, v) in &r.axes {
            assert!((35..=99).contains(v));
        }
        assert!((40..=98).contains(&r.overall));
    }

    #[test]
    fn lucky_items_cover_all_elements() {
        for e in Element::all() {
            let items = lucky_items(e);
            assert!(!items.color.is_empty());
            assert!(items.number > 0);
        }
    }
}
