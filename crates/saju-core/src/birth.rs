//! Parses free-form Korean birth text like "1994년 10월 3일 오후 7시 30분 여성".
//!
//! The date and gender are required; the hour defaults to noon when the user
//! doesn't know their birth time, the minute to 0.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::{BirthInfo, Gender};

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*년\s*(\d{1,2})\s*월\s*(\d{1,2})\s*일").expect("date regex")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(새벽|아침|오전|낮|오후|저녁|밤)?\s*(\d{1,2})\s*시(?:\s*(\d{1,2})\s*분)?")
        .expect("time regex")
});

static GENDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(남성|남자|여성|여자)|(?:^|\s)(남|여)(?:\s|$|이)").expect("gender regex"));

/// Parse a birth tuple out of an utterance. `None` means the text is not a
/// birth answer at all (the orchestrator then re-prompts or classifies).
pub fn parse_birth_text(text: &str) -> Option<BirthInfo> {
    let date = DATE_RE.captures(text)?;
    let year: i32 = date[1].parse().ok()?;
    let month: u32 = date[2].parse().ok()?;
    let day: u32 = date[3].parse().ok()?;

    let gender = parse_gender(text)?;
    let (hour, minute) = parse_time(text).unwrap_or((12, 0));

    let info = BirthInfo {
        year,
        month,
        day,
        hour,
        minute,
        gender,
    };
    info.validate().ok()?;
    Some(info)
}

fn parse_gender(text: &str) -> Option<Gender> {
    let caps = GENDER_RE.captures(text)?;
    let word = caps.get(1).or_else(|| caps.get(2))?.as_str();
    word.parse().ok()
}

/// Returns (hour, minute) in 24h form, applying the am/pm marker.
fn parse_time(text: &str) -> Option<(u32, u32)> {
    // Skip the date portion so "10월 3일" digits are not misread as a time.
    let after_date = DATE_RE
        .find(text)
        .map(|m| &text[m.end()..])
        .unwrap_or(text);

    let caps = TIME_RE.captures(after_date)?;
    let marker = caps.get(1).map(|m| m.as_str());
    let raw_hour: u32 = caps[2].parse().ok()?;
    let minute: u32 = caps
        .get(3)
        .map(|m| m.as_str().parse().unwrap_or(0))
        .unwrap_or(0);

    if raw_hour > 23 {
        return None;
    }

    let hour = match marker {
        Some("오후") | Some("저녁") | Some("밤") => {
            if raw_hour == 12 {
                // "밤 12시" is midnight, "오후 12시" is noon.
                if marker == Some("밤") {
                    0
                } else {
                    12
                }
            } else if raw_hour < 12 {
                raw_hour + 12
            } else {
                raw_hour
            }
        }
        Some("새벽") | Some("아침") | Some("오전") => {
            if raw_hour == 12 {
                0
            } else {
                raw_hour
            }
        }
        _ => raw_hour,
    };

    Some((hour, minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_form_with_pm_time() {
        let b = parse_birth_text("1994년 10월 3일 오후 7시 30분 여성").unwrap();
        assert_eq!(
            (b.year, b.month, b.day, b.hour, b.minute),
            (1994, 10, 3, 19, 30)
        );
        assert_eq!(b.gender, Gender::F);
    }

    #[test]
    fn partner_form_without_minute() {
        let b = parse_birth_text("1995년 3월 15일 오후 2시 남성").unwrap();
        assert_eq!(
            (b.year, b.month, b.day, b.hour, b.minute),
            (1995, 3, 15, 14, 0)
        );
        assert_eq!(b.gender, Gender::M);
    }

    #[test]
    fn missing_time_defaults_to_noon() {
        let b = parse_birth_text("2001년 1월 1일 남자").unwrap();
        assert_eq!((b.hour, b.minute), (12, 0));
    }

    #[test]
    fn twenty_four_hour_form() {
        let b = parse_birth_text("1988년 8월 8일 23시 10분 여자").unwrap();
        assert_eq!((b.hour, b.minute), (23, 10));
    }

    #[test]
    fn night_twelve_is_midnight() {
        let b = parse_birth_text("1990년 5월 2일 밤 12시 여성").unwrap();
        assert_eq!(b.hour, 0);
    }

    #[test]
    fn noon_twelve_stays_noon() {
        let b = parse_birth_text("1990년 5월 2일 오후 12시 여성").unwrap();
        assert_eq!(b.hour, 12);
    }

    #[test]
    fn missing_gender_fails() {
        assert!(parse_birth_text("1994년 10월 3일 오후 7시").is_none());
    }

    #[test]
    fn missing_date_fails() {
        assert!(parse_birth_text("올해 연애운 어때? 여성").is_none());
        assert!(parse_birth_text("안녕하세요").is_none());
    }

    #[test]
    fn out_of_range_date_fails() {
        assert!(parse_birth_text("1899년 1월 1일 남성").is_none());
        assert!(parse_birth_text("1990년 13월 1일 남성").is_none());
    }
}
