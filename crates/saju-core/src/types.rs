use serde::{Deserialize, Serialize};
use std::fmt;

/// Chat platform an inbound message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Kakao,
    Web,
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Platform::Telegram => write!(f, "telegram"),
            Platform::Kakao => write!(f, "kakao"),
            Platform::Web => write!(f, "web"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "telegram" => Ok(Platform::Telegram),
            "kakao" => Ok(Platform::Kakao),
            "web" => Ok(Platform::Web),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Identifies one user on one platform. The (platform, platform_user_id)
/// pair is the primary key for every per-user table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserKey {
    pub platform: Platform,
    pub platform_user_id: String,
}

impl UserKey {
    pub fn new(platform: Platform, platform_user_id: impl Into<String>) -> Self {
        Self {
            platform,
            platform_user_id: platform_user_id.into(),
        }
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.platform_user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Gender {
    M,
    F,
}

impl Gender {
    /// Label used by the external pillar API (`gender={여|남}`).
    pub fn api_label(&self) -> &'static str {
        match self {
            Gender::M => "남",
            Gender::F => "여",
        }
    }

    pub fn korean(&self) -> &'static str {
        match self {
            Gender::M => "남성",
            Gender::F => "여성",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::M => write!(f, "M"),
            Gender::F => write!(f, "F"),
        }
    }
}

impl std::str::FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "M" | "m" | "남" | "남성" | "남자" => Ok(Gender::M),
            "F" | "f" | "여" | "여성" | "여자" => Ok(Gender::F),
            other => Err(format!("unknown gender: {}", other)),
        }
    }
}

/// A validated birth tuple. Field ranges are enforced by [`BirthInfo::validate`]
/// before any row is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BirthInfo {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub gender: Gender,
}

impl BirthInfo {
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !(1900..=2099).contains(&self.year) {
            return Err(format!("birth year out of range: {}", self.year));
        }
        if !(1..=12).contains(&self.month) {
            return Err(format!("birth month out of range: {}", self.month));
        }
        if !(1..=31).contains(&self.day) {
            return Err(format!("birth day out of range: {}", self.day));
        }
        if self.hour > 23 {
            return Err(format!("birth hour out of range: {}", self.hour));
        }
        if self.minute > 59 {
            return Err(format!("birth minute out of range: {}", self.minute));
        }
        Ok(())
    }

    /// Stable key for the pillar cache.
    pub fn cache_key(&self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.gender
        )
    }
}

/// User entitlement class, resolved from subscription, credits, and the
/// profile premium flag. Ordering matters: `premium > basic > free`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Basic,
    Premium,
}

impl Tier {
    /// Billable requests allowed per KST day.
    pub fn daily_limit(&self) -> u32 {
        match self {
            Tier::Free => 3,
            Tier::Basic => 10,
            Tier::Premium => 9999,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Free => write!(f, "free"),
            Tier::Basic => write!(f, "basic"),
            Tier::Premium => write!(f, "premium"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

/// Platform-neutral quick action attached to a reply. Telegram renders these
/// as inline-keyboard buttons, Kakao as quick-reply chips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiAction {
    pub label: String,
    pub payload: String,
}

impl UiAction {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            payload: payload.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn birth_validation_rejects_out_of_range() {
        let ok = BirthInfo {
            year: 1994,
            month: 10,
            day: 3,
            hour: 19,
            minute: 30,
            gender: Gender::F,
        };
        assert!(ok.validate().is_ok());

        let mut bad = ok;
        bad.year = 1899;
        assert!(bad.validate().is_err());
        bad = ok;
        bad.month = 13;
        assert!(bad.validate().is_err());
        bad = ok;
        bad.hour = 24;
        assert!(bad.validate().is_err());
        bad = ok;
        bad.minute = 60;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn tier_ordering_and_limits() {
        assert!(Tier::Premium > Tier::Basic);
        assert!(Tier::Basic > Tier::Free);
        assert_eq!(Tier::Free.daily_limit(), 3);
        assert_eq!(Tier::Basic.daily_limit(), 10);
        assert_eq!(Tier::Premium.daily_limit(), 9999);
    }

    #[test]
    fn gender_parses_korean_forms() {
        assert_eq!("여성".parse::<Gender>().unwrap(), Gender::F);
        assert_eq!("남".parse::<Gender>().unwrap(), Gender::M);
        assert!("?".parse::<Gender>().is_err());
    }

    #[test]
    fn cache_key_is_stable() {
        let b = BirthInfo {
            year: 1994,
            month: 10,
            day: 3,
            hour: 19,
            minute: 30,
            gender: Gender::F,
        };
        assert_eq!(b.cache_key(), "1994-10-03T19:30:F");
    }
}
