//! Deterministic pillar arithmetic. Anchor-based day counting, table-driven
//! month/hour stems. No wall-clock reads — callers pass the date in.

use chrono::NaiveDate;

use saju_core::types::BirthInfo;

use crate::error::{PillarError, Result};
use crate::tables::{HOUR_STEM_START, MONTH_STEM_OFFSET};
use crate::types::{Pillar, Pillars};

/// 1900-01-01 was a 갑술 day (stem 0, branch 10).
const ANCHOR_YEAR: i32 = 1900;
const ANCHOR_STEM: i64 = 0;
const ANCHOR_BRANCH: i64 = 10;

pub fn year_pillar(year: i32) -> Pillar {
    let stem = (year - 4).rem_euclid(10) as u8;
    let branch = (year - 4).rem_euclid(12) as u8;
    Pillar::new(stem, branch)
}

/// Solar month 2 aligns with branch 인 (tiger).
pub fn month_pillar(year: i32, month: u32) -> Pillar {
    let year_stem = year_pillar(year).stem;
    let offset = MONTH_STEM_OFFSET[(year_stem % 5) as usize];
    let m = (month as i64 - 2).rem_euclid(12);
    let stem = ((offset as i64 + m) % 10) as u8;
    let branch = ((m + 2) % 12) as u8;
    Pillar::new(stem, branch)
}

pub fn day_pillar(date: NaiveDate) -> Pillar {
    let anchor = NaiveDate::from_ymd_opt(ANCHOR_YEAR, 1, 1).expect("anchor date");
    let days = date.signed_duration_since(anchor).num_days();
    let stem = (ANCHOR_STEM + days).rem_euclid(10) as u8;
    let branch = (ANCHOR_BRANCH + days).rem_euclid(12) as u8;
    Pillar::new(stem, branch)
}

/// The 23:00–00:59 slot maps to branch 0 (자시).
pub fn hour_pillar(day_stem: u8, hour: u32) -> Pillar {
    let shi = (((hour + 1) % 24) / 2) as u8;
    let start = HOUR_STEM_START[(day_stem % 5) as usize];
    let stem = (start + shi) % 10;
    Pillar::new(stem, shi)
}

/// Local deterministic computation of all four pillars.
pub fn compute_pillars(birth: &BirthInfo) -> Result<Pillars> {
    birth
        .validate()
        .map_err(PillarError::InvalidBirth)?;
    let date = NaiveDate::from_ymd_opt(birth.year, birth.month, birth.day)
        .ok_or_else(|| PillarError::InvalidBirth(format!(
            "no such calendar date: {}-{}-{}",
            birth.year, birth.month, birth.day
        )))?;

    let year = year_pillar(birth.year);
    let month = month_pillar(birth.year, birth.month);
    let day = day_pillar(date);
    let hour = hour_pillar(day.stem, birth.hour);

    Ok(Pillars {
        year,
        month,
        day,
        hour,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::types::Gender;

    fn birth(y: i32, m: u32, d: u32, h: u32) -> BirthInfo {
        BirthInfo {
            year: y,
            month: m,
            day: d,
            hour: h,
            minute: 0,
            gender: Gender::F,
        }
    }

    #[test]
    fn year_pillar_known_values() {
        assert_eq!(year_pillar(1984).name(), "갑자");
        assert_eq!(year_pillar(2024).name(), "갑진");
        assert_eq!(year_pillar(1900).name(), "경자");
    }

    #[test]
    fn day_pillar_anchor() {
        let anchor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        assert_eq!(day_pillar(anchor).name(), "갑술");
    }

    #[test]
    fn day_pillar_known_date() {
        // 2000-01-01 is a 무오 day.
        let d = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        assert_eq!(day_pillar(d).name(), "무오");
    }

    #[test]
    fn day_pillar_rotates_by_n() {
        let anchor = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        for n in [-61i64, -13, -1, 0, 1, 9, 60, 123] {
            let date = anchor + chrono::Duration::days(n);
            let p = day_pillar(date);
            assert_eq!(p.stem as i64, (ANCHOR_STEM + n).rem_euclid(10), "n={}", n);
            assert_eq!(
                p.branch as i64,
                (ANCHOR_BRANCH + n).rem_euclid(12),
                "n={}",
                n
            );
        }
    }

    #[test]
    fn month_branch_feb_is_tiger() {
        for year in [1950, 1984, 2024] {
            assert_eq!(month_pillar(year, 2).branch_name(), "인");
            assert_eq!(month_pillar(year, 1).branch_name(), "축");
            assert_eq!(month_pillar(year, 12).branch_name(), "자");
        }
    }

    #[test]
    fn month_stem_offset_table() {
        // 갑 year (1984): month 2 stem should be 병.
        assert_eq!(month_pillar(1984, 2).stem_name(), "병");
        // 을 year (1985): 무.
        assert_eq!(month_pillar(1985, 2).stem_name(), "무");
        // 계 year (2023): 갑.
        assert_eq!(month_pillar(2023, 2).stem_name(), "갑");
    }

    #[test]
    fn hour_slot_boundaries() {
        // 23:00 through 00:59 is 자시 (branch 0).
        assert_eq!(hour_pillar(0, 23).branch, 0);
        assert_eq!(hour_pillar(0, 0).branch, 0);
        assert_eq!(hour_pillar(0, 1).branch, 1);
        assert_eq!(hour_pillar(0, 12).branch, 6);
        assert_eq!(hour_pillar(0, 22).branch, 11);
    }

    #[test]
    fn hour_stem_start_table() {
        // 갑 day, 자시 → 갑자시.
        assert_eq!(hour_pillar(0, 0).name(), "갑자");
        // 을 day, 자시 → 병자시.
        assert_eq!(hour_pillar(1, 0).name(), "병자");
        // 계 day, 자시 → 임자시.
        assert_eq!(hour_pillar(9, 0).name(), "임자");
    }

    #[test]
    fn compute_is_deterministic() {
        let b = birth(1994, 10, 3, 19);
        let a = compute_pillars(&b).unwrap();
        let c = compute_pillars(&b).unwrap();
        assert_eq!(a, c);
    }

    #[test]
    fn compute_rejects_bad_dates() {
        assert!(compute_pillars(&birth(1994, 2, 30, 0)).is_err());
        assert!(compute_pillars(&birth(1899, 1, 1, 0)).is_err());
    }
}
