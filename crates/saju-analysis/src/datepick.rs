//! Auspicious-date scoring over the next N days. Fully deterministic — the
//! scored list needs no LLM.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use saju_pillars::engine::day_pillar;
use saju_pillars::luck::{is_clash, is_combine};
use saju_pillars::tables::{element_relation, ElementRelation, BRANCH_ELEMENT};
use saju_pillars::types::{Pillar, Pillars};

use crate::seed::clamp;

pub const DEFAULT_WINDOW_DAYS: u32 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Wedding,
    Moving,
    Opening,
    Contract,
    Travel,
    General,
}

impl EventType {
    pub fn korean(&self) -> &'static str {
        match self {
            EventType::Wedding => "결혼",
            EventType::Moving => "이사",
            EventType::Opening => "개업",
            EventType::Contract => "계약",
            EventType::Travel => "여행",
            EventType::General => "중요한 일",
        }
    }

    /// Keyword detection from the user's question.
    pub fn from_text(text: &str) -> EventType {
        const RULES: [(&str, EventType); 8] = [
            ("결혼", EventType::Wedding),
            ("상견례", EventType::Wedding),
            ("이사", EventType::Moving),
            ("입주", EventType::Moving),
            ("개업", EventType::Opening),
            ("오픈", EventType::Opening),
            ("계약", EventType::Contract),
            ("여행", EventType::Travel),
        ];
        for (kw, ev) in RULES {
            if text.contains(kw) {
                return ev;
            }
        }
        EventType::General
    }

    fn base_adjust(&self) -> i32 {
        match self {
            EventType::Wedding => 2,
            EventType::Moving => 0,
            EventType::Opening => 1,
            EventType::Contract => 0,
            EventType::Travel => 3,
            EventType::General => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    /// 85 and up.
    Excellent,
    /// 70..85.
    Good,
    /// 50..70.
    Fair,
    /// Below 50.
    Poor,
}

impl Grade {
    pub fn korean(&self) -> &'static str {
        match self {
            Grade::Excellent => "대길",
            Grade::Good => "길",
            Grade::Fair => "보통",
            Grade::Poor => "흉",
        }
    }

    fn from_score(score: i32) -> Grade {
        if score >= 85 {
            Grade::Excellent
        } else if score >= 70 {
            Grade::Good
        } else if score >= 50 {
            Grade::Fair
        } else {
            Grade::Poor
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayScore {
    pub date: NaiveDate,
    pub pillar: Pillar,
    pub score: i32,
    pub grade: Grade,
}

/// Score one candidate day against the user's day branch.
pub fn score_day(user_day_branch: u8, event: EventType, candidate: Pillar) -> i32 {
    let mut score = 60 + event.base_adjust();

    if is_clash(user_day_branch, candidate.branch) {
        score -= 25;
    } else if is_combine(user_day_branch, candidate.branch) {
        score += 15;
    }

    let mine = BRANCH_ELEMENT[user_day_branch as usize];
    match element_relation(mine, candidate.stem_element()) {
        ElementRelation::Same => score += 12,
        ElementRelation::GeneratesMe => score += 10,
        ElementRelation::IGenerate => score += 5,
        ElementRelation::ControlsMe => score -= 15,
        ElementRelation::IControl => {}
    }

    clamp(score, 15, 100)
}

/// Score each of the `window` days starting the day after `from`.
pub fn pick_days(
    user: &Pillars,
    event: EventType,
    from: NaiveDate,
    window: u32,
) -> Vec<DayScore> {
    let branch = user.day.branch;
    (1..=window as i64)
        .filter_map(|offset| from.checked_add_days(chrono::Days::new(offset as u64)))
        .map(|date| {
            let pillar = day_pillar(date);
            let score = score_day(branch, event, pillar);
            DayScore {
                date,
                pillar,
                score,
                grade: Grade::from_score(score),
            }
        })
        .collect()
}

/// The best-scoring days of the window, highest first, ties by earliest date.
pub fn best_days(scores: &[DayScore], n: usize) -> Vec<DayScore> {
    let mut sorted: Vec<DayScore> = scores.to_vec();
    sorted.sort_by(|a, b| b.score.cmp(&a.score).then(a.date.cmp(&b.date)));
    sorted.truncate(n);
    sorted
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
    fn window_has_fourteen_days() {
        let from = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let days = pick_days(&chart(), EventType::Moving, from, DEFAULT_WINDOW_DAYS);
        assert_eq!(days.len(), 14);
        assert_eq!(days[0].date, from.succ_opt().unwrap());
    }

    #[test]
    fn scores_clamped_and_graded() {
        let from = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        for d in pick_days(&chart(), EventType::Wedding, from, 30) {
            assert!((15..=100).contains(&d.score));
            assert_eq!(d.grade, Grade::from_score(d.score));
        }
    }

    #[test]
    fn clash_day_scores_below_combine_day() {
        // User day branch 0 (자): 오 (6) clashes, 축 (1) combines.
        let clash_day = Pillar::new(0, 6);
        let combine_day = Pillar::new(0, 1);
        assert!(
            score_day(0, EventType::General, clash_day)
                < score_day(0, EventType::General, combine_day)
        );
    }

    #[test]
    fn best_days_sorted_desc() {
        let from = NaiveDate::from_ymd_opt(2026, 8, 1).unwrap();
        let all = pick_days(&chart(), EventType::Contract, from, DEFAULT_WINDOW_DAYS);
        let top = best_days(&all, 3);
        assert_eq!(top.len(), 3);
        assert!(top[0].score >= top[1].score && top[1].score >= top[2].score);
    }

    #[test]
    fn event_type_from_text() {
        assert_eq!(EventType::from_text("결혼 날짜 잡아줘"), EventType::Wedding);
        assert_eq!(EventType::from_text("이사 언제가 좋아?"), EventType::Moving);
        assert_eq!(EventType::from_text("좋은 날 알려줘"), EventType::General);
    }
}
