//! Year-luck interaction: the current-year pillar against the natal chart.

use serde::{Deserialize, Serialize};

use crate::engine::{month_pillar, year_pillar};
use crate::tables::{element_relation, ElementRelation};
use crate::types::{Pillar, PillarPosition, Pillars};
use crate::yukchin::{classify, Yukchin};

/// Branch-pair interaction categories that modify scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    /// 충 — opposite branches.
    Clash,
    /// 육합 — six-combine pairs.
    Combine,
    /// 형 — punishment groups (삼형, 상형, 자형).
    Punishment,
}

impl InteractionKind {
    pub fn korean(&self) -> &'static str {
        match self {
            InteractionKind::Clash => "충",
            InteractionKind::Combine => "합",
            InteractionKind::Punishment => "형",
        }
    }
}

/// Clash: branches six apart.
pub fn is_clash(a: u8, b: u8) -> bool {
    (a + 6) % 12 == b
}

/// Six-combine pairs: 자축, 인해, 묘술, 진유, 사신, 오미.
pub fn is_combine(a: u8, b: u8) -> bool {
    const PAIRS: [(u8, u8); 6] = [(0, 1), (2, 11), (3, 10), (4, 9), (5, 8), (6, 7)];
    PAIRS
        .iter()
        .any(|&(x, y)| (a == x && b == y) || (a == y && b == x))
}

/// Punishment: the 인사신 and 축술미 trios, the 자묘 pair, and the four
/// self-punishing branches (진, 오, 유, 해).
pub fn is_punishment(a: u8, b: u8) -> bool {
    const TRIO_A: [u8; 3] = [2, 5, 8]; // 인사신
    const TRIO_B: [u8; 3] = [1, 10, 7]; // 축술미
    if a != b && TRIO_A.contains(&a) && TRIO_A.contains(&b) {
        return true;
    }
    if a != b && TRIO_B.contains(&a) && TRIO_B.contains(&b) {
        return true;
    }
    if (a == 0 && b == 3) || (a == 3 && b == 0) {
        return true;
    }
    a == b && matches!(a, 4 | 6 | 9 | 11)
}

pub fn interaction(natal: u8, other: u8) -> Option<InteractionKind> {
    if is_clash(natal, other) {
        Some(InteractionKind::Clash)
    } else if is_combine(natal, other) {
        Some(InteractionKind::Combine)
    } else if is_punishment(natal, other) {
        Some(InteractionKind::Punishment)
    } else {
        None
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchInteraction {
    pub position: PillarPosition,
    pub natal_branch: u8,
    pub kind: InteractionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuckReport {
    pub year: i32,
    pub year_pillar: Pillar,
    pub month_pillar: Pillar,
    /// Yukchin of the current-year stem against the day master — computed
    /// here once so prompts can embed it as a constant.
    pub year_stem_yukchin: Yukchin,
    pub interactions: Vec<BranchInteraction>,
    /// Korean description of the year element's effect on the day master.
    pub element_impact: String,
}

impl LuckReport {
    pub fn clash_count(&self) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.kind == InteractionKind::Clash)
            .count()
    }

    pub fn combine_count(&self) -> usize {
        self.interactions
            .iter()
            .filter(|i| i.kind == InteractionKind::Combine)
            .count()
    }
}

fn element_impact_text(pillars: &Pillars, year: Pillar) -> String {
    let me = pillars.day_master_element();
    let yr = year.stem_element();
    let rel = element_relation(me, yr);
    let desc = match rel {
        ElementRelation::Same => "일간과 같은 기운이라 주관과 자존심이 강해지는 해",
        ElementRelation::GeneratesMe => "일간을 생해주는 기운이라 도움과 기회가 따르는 해",
        ElementRelation::IGenerate => "일간의 기운을 쓰는 해라 활동과 표현이 많아지는 해",
        ElementRelation::ControlsMe => "일간을 극하는 기운이라 책임과 압박이 커지는 해",
        ElementRelation::IControl => "일간이 다스리는 기운이라 재물 활동이 활발해지는 해",
    };
    format!(
        "올해는 {}({}) 기운의 해로, {}입니다.",
        year.stem_name(),
        yr.korean(),
        desc
    )
}

/// Analyze the interaction between the natal chart and the given calendar
/// year/month.
pub fn analyze_year_luck(pillars: &Pillars, year: i32, month: u32) -> LuckReport {
    let yp = year_pillar(year);
    let mp = month_pillar(year, month);
    let yukchin = classify(pillars.day_master(), yp.stem);

    let mut interactions = Vec::new();
    for (position, p) in pillars.positions() {
        if let Some(kind) = interaction(p.branch, yp.branch) {
            interactions.push(BranchInteraction {
                position,
                natal_branch: p.branch,
                kind,
            });
        }
    }

    LuckReport {
        year,
        year_pillar: yp,
        month_pillar: mp,
        year_stem_yukchin: yukchin,
        interactions,
        element_impact: element_impact_text(pillars, yp),
    }
}
