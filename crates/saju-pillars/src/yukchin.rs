//! The ten six-relation (yukchin) labels between any stem and the day master.
//! (element relation × polarity match) → exactly one label.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::tables::{element_relation, stem_is_yang, ElementRelation, STEM_ELEMENT};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Yukchin {
    Bigyeon,   // 비견
    Geopjae,   // 겁재
    Siksin,    // 식신
    Sanggwan,  // 상관
    Pyeonjae,  // 편재
    Jeongjae,  // 정재
    Pyeongwan, // 편관
    Jeonggwan, // 정관
    Pyeonin,   // 편인
    Jeongin,   // 정인
}

impl Yukchin {
    pub fn korean(&self) -> &'static str {
        match self {
            Yukchin::Bigyeon => "비견",
            Yukchin::Geopjae => "겁재",
            Yukchin::Siksin => "식신",
            Yukchin::Sanggwan => "상관",
            Yukchin::Pyeonjae => "편재",
            Yukchin::Jeongjae => "정재",
            Yukchin::Pyeongwan => "편관",
            Yukchin::Jeonggwan => "정관",
            Yukchin::Pyeonin => "편인",
            Yukchin::Jeongin => "정인",
        }
    }

    /// Wealth stars (재성).
    pub fn is_wealth(&self) -> bool {
        matches!(self, Yukchin::Pyeonjae | Yukchin::Jeongjae)
    }

    /// Output stars (식상).
    pub fn is_output(&self) -> bool {
        matches!(self, Yukchin::Siksin | Yukchin::Sanggwan)
    }

    /// Peer stars (비겁).
    pub fn is_peer(&self) -> bool {
        matches!(self, Yukchin::Bigyeon | Yukchin::Geopjae)
    }

    /// Authority stars (관성).
    pub fn is_authority(&self) -> bool {
        matches!(self, Yukchin::Pyeongwan | Yukchin::Jeonggwan)
    }

    /// Resource stars (인성).
    pub fn is_resource(&self) -> bool {
        matches!(self, Yukchin::Pyeonin | Yukchin::Jeongin)
    }
}

impl fmt::Display for Yukchin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.korean())
    }
}

/// Classify `other` relative to the day master stem.
pub fn classify(day_master: u8, other: u8) -> Yukchin {
    let me = STEM_ELEMENT[day_master as usize];
    let you = STEM_ELEMENT[other as usize];
    let same_polarity = stem_is_yang(day_master) == stem_is_yang(other);

    match element_relation(me, you) {
        ElementRelation::Same => {
            if same_polarity {
                Yukchin::Bigyeon
            } else {
                Yukchin::Geopjae
            }
        }
        ElementRelation::IGenerate => {
            if same_polarity {
                Yukchin::Siksin
            } else {
                Yukchin::Sanggwan
            }
        }
        ElementRelation::IControl => {
            if same_polarity {
                Yukchin::Pyeonjae
            } else {
                Yukchin::Jeongjae
            }
        }
        ElementRelation::ControlsMe => {
            if same_polarity {
                Yukchin::Pyeongwan
            } else {
                Yukchin::Jeonggwan
            }
        }
        ElementRelation::GeneratesMe => {
            if same_polarity {
                Yukchin::Pyeonin
            } else {
                Yukchin::Jeongin
            }
        }
    }
}
