//! Prompt packages, one per request type. Each package is a system prompt
//! plus a single user message ready to hand to the provider.
//!
//! The current-year yukchin is always injected as a precomputed constant —
//! the model re-derives it wrong often enough that we never let it try.

use chrono::{DateTime, Datelike, FixedOffset};

use saju_analysis::compat::CompatReport;
use saju_analysis::fortune::FortuneReport;
use saju_analysis::interest::InterestCategory;
use saju_analysis::wealth::WealthReport;
use saju_pillars::luck::LuckReport;
use saju_pillars::strength::Structure;
use saju_pillars::types::Pillars;

use crate::provider::{ChatMessage, ChatRequest};

/// The interim message is a short one-liner, never an analysis.
pub const INTERIM_MAX_TOKENS: u32 = 120;
pub const PUSH_MAX_TOKENS: u32 = 450;
const READING_MAX_TOKENS: u32 = 1200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Formal,
    Casual,
}

/// Mirror the user's register. Endings like 요/습니다 mark polite speech.
pub fn detect_tone(text: &str) -> Tone {
    const FORMAL_MARKERS: [&str; 6] = ["요?", "요.", "습니다", "습니까", "세요", "어요"];
    let trimmed = text.trim_end();
    if FORMAL_MARKERS.iter().any(|m| trimmed.contains(m)) || trimmed.ends_with('요') {
        Tone::Formal
    } else {
        Tone::Casual
    }
}

fn tone_rule(tone: Tone) -> &'static str {
    match tone {
        Tone::Formal => "사용자가 존댓말을 쓰므로 답변 전체를 존댓말로 일관되게 작성하세요.",
        Tone::Casual => "사용자가 반말을 쓰므로 답변 전체를 친근한 반말로 일관되게 작성하세요.",
    }
}

#[derive(Debug, Clone)]
pub struct PromptPackage {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl PromptPackage {
    pub fn into_request(self, history: Vec<ChatMessage>) -> ChatRequest {
        let mut messages = history;
        messages.push(ChatMessage::user(self.user));
        ChatRequest {
            system: self.system,
            messages,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

fn base_rules(now: DateTime<FixedOffset>, tone: Tone) -> String {
    format!(
        "당신은 따뜻하고 통찰력 있는 사주 상담가입니다.\n\
         - 모든 답변은 한국어로 작성합니다.\n\
         - 오늘 날짜는 {}년 {}월 {}일(한국 시간)입니다. '올해', '이번 달' 같은 \
         상대적 표현은 이 날짜 기준으로 해석하세요.\n\
         - {}\n\
         - 사주 용어는 쉽게 풀어 설명하세요.",
        now.year(),
        now.month(),
        now.day(),
        tone_rule(tone)
    )
}

fn chart_block(pillars: &Pillars, structure: &Structure) -> String {
    format!(
        "사주 명식: {}\n일간: {} ({})\n오행 분포:\n{}",
        pillars.chart_line(),
        pillars.day.stem_name(),
        structure.label.korean(),
        structure.distribution_lines()
    )
}

fn luck_block(luck: &LuckReport) -> String {
    let mut s = format!(
        "[고정 상수 — 다시 계산하지 말 것] {}년의 세운 천간은 {}이며 일간 기준 육친은 '{}'입니다.\n{}",
        luck.year,
        luck.year_pillar.stem_name(),
        luck.year_stem_yukchin.korean(),
        luck.element_impact
    );
    if !luck.interactions.is_empty() {
        s.push_str("\n지지 작용: ");
        for (i, it) in luck.interactions.iter().enumerate() {
            if i > 0 {
                s.push_str(", ");
            }
            s.push_str(&format!(
                "{} {}({})",
                it.position.korean(),
                saju_pillars::tables::BRANCHES[it.natal_branch as usize],
                it.kind.korean()
            ));
        }
    }
    s
}

const FREEMIUM_RULE: &str = "\n답변은 반드시 두 구간으로 나눠 태그로 감싸세요.\n\
    [FREE] 흥미를 끌되 핵심 결론은 밝히지 않는 도입부 [/FREE]\n\
    [PREMIUM] 구체적인 시기와 결정적 조언 [/PREMIUM]\n\
    FREE 구간은 궁금증을 남겨야 하고, 시기/결정은 PREMIUM 구간에만 적으세요.";

/// First reading right after profile registration.
pub fn first_reading(
    pillars: &Pillars,
    structure: &Structure,
    luck: &LuckReport,
    now: DateTime<FixedOffset>,
) -> PromptPackage {
    let system = format!(
        "{}\n\n첫 만남 리딩입니다. 전체 성격과 기질, 올해의 큰 흐름을 짚어 주되 \
         과장하지 말고 희망적인 톤을 유지하세요.",
        base_rules(now, Tone::Formal)
    );
    let user = format!(
        "{}\n\n{}\n\n위 명식을 가진 사용자의 첫 사주 풀이를 작성해 주세요.",
        chart_block(pillars, structure),
        luck_block(luck)
    );
    PromptPackage {
        system,
        user,
        max_tokens: READING_MAX_TOKENS,
        temperature: 0.7,
    }
}

/// General saju Q&A — grounded with retrieved classics, paid-track tagged.
pub fn general_question(
    question: &str,
    pillars: &Pillars,
    structure: &Structure,
    luck: &LuckReport,
    classics: &[String],
    now: DateTime<FixedOffset>,
) -> PromptPackage {
    let tone = detect_tone(question);
    let mut system = base_rules(now, tone);
    system.push_str(FREEMIUM_RULE);

    let mut user = format!(
        "{}\n\n{}",
        chart_block(pillars, structure),
        luck_block(luck)
    );
    if !classics.is_empty() {
        user.push_str("\n\n고전 참고 구절:\n");
        for chunk in classics {
            user.push_str("- ");
            user.push_str(chunk);
            user.push('\n');
        }
    }
    user.push_str(&format!("\n질문: {}", question));

    PromptPackage {
        system,
        user,
        max_tokens: READING_MAX_TOKENS,
        temperature: 0.7,
    }
}

/// Compatibility reading over the precomputed score report.
pub fn compatibility(
    question: &str,
    report: &CompatReport,
    now: DateTime<FixedOffset>,
) -> PromptPackage {
    let tone = detect_tone(question);
    let mut system = base_rules(now, tone);
    system.push_str(FREEMIUM_RULE);

    let mut axes = String::new();
    for (name, score) in &report.axes {
        axes.push_str(&format!("- {}: {}점\n", name, score));
    }

    let user = format!(
        "나의 명식: {}\n상대 명식: {}\n\n계산된 궁합 점수(그대로 사용할 것):\n\
         - 종합 {}점\n- 오행 관계 {}점 ({})\n- 지지 조화 {}점 (합 {}개, 충 {}개)\n{}\n\
         질문: {}\n\n위 점수를 근거로 궁합 풀이를 작성해 주세요.",
        report.my_chart,
        report.partner_chart,
        report.overall,
        report.element_score,
        report.element_desc,
        report.harmony_score,
        report.combine_count,
        report.clash_count,
        axes,
        question
    );

    PromptPackage {
        system,
        user,
        max_tokens: READING_MAX_TOKENS,
        temperature: 0.7,
    }
}

/// Wealth deep-dive over the precomputed score report.
pub fn wealth(
    question: &str,
    pillars: &Pillars,
    report: &WealthReport,
    luck: &LuckReport,
    now: DateTime<FixedOffset>,
) -> PromptPackage {
    let tone = detect_tone(question);
    let mut system = base_rules(now, tone);
    system.push_str(FREEMIUM_RULE);

    let mut axes = String::new();
    for (name, score) in report.axes() {
        axes.push_str(&format!("- {}: {}점\n", name, score));
    }

    let user = format!(
        "명식: {}\n\n{}\n\n계산된 재물운 점수(그대로 사용할 것):\n- 종합 {}점\n{}\n질문: {}",
        pillars.chart_line(),
        luck_block(luck),
        report.overall,
        axes,
        question
    );

    PromptPackage {
        system,
        user,
        max_tokens: READING_MAX_TOKENS,
        temperature: 0.7,
    }
}

/// Daily push message. Post-rules (emoji first line, ████ blanks, closing
/// question) are enforced by the caller; the prompt asks for them anyway.
pub fn daily_push(
    category: InterestCategory,
    fortune: &FortuneReport,
    pillars: &Pillars,
    now: DateTime<FixedOffset>,
) -> PromptPackage {
    let system = format!(
        "{}\n\n아침 푸시 메시지를 작성합니다. 규칙:\n\
         - 첫 줄은 {} 이모지로 시작\n\
         - 핵심 내용 네 군데 이상을 ████ 로 가리기 (유료 해제 유도)\n\
         - 마지막 줄은 반드시 물음표로 끝나는 질문\n\
         - 전체 4~6줄, 가볍고 호기심을 끄는 톤",
        base_rules(now, Tone::Formal),
        category.emoji()
    );
    let user = format!(
        "오늘은 {} 기운({})의 날입니다. 종합 {}점.\n사용자 명식: {}\n\
         관심 주제: {}\n오늘의 {} 운세 푸시를 작성해 주세요.",
        fortune.today_pillar.name(),
        fortune.category.korean(),
        fortune.overall,
        pillars.chart_line(),
        category.korean(),
        category.korean()
    );
    PromptPackage {
        system,
        user,
        max_tokens: PUSH_MAX_TOKENS,
        temperature: 0.8,
    }
}

/// Interim "still working" one-liner shown while the real analysis runs.
pub fn interim(question: &str, now: DateTime<FixedOffset>) -> PromptPackage {
    let tone = detect_tone(question);
    let system = format!(
        "{}\n\n사주를 보는 중이라는 짧은 한 문장을 작성하세요. 분석 내용은 \
         절대 미리 말하지 말고, 기대감만 주세요. 한 문장, 40자 이내.",
        base_rules(now, tone)
    );
    let user = format!("질문: {}", question);
    PromptPackage {
        system,
        user,
        max_tokens: INTERIM_MAX_TOKENS,
        temperature: 0.9,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saju_core::clock::{FixedClock, KstClock};
    use saju_core::types::{BirthInfo, Gender};
    use saju_pillars::engine::compute_pillars;
    use saju_pillars::luck::analyze_year_luck;
    use saju_pillars::strength::analyze_structure;

    fn fixtures() -> (Pillars, Structure, LuckReport) {
        let pillars = compute_pillars(&BirthInfo {
            year: 1994,
            month: 10,
            day: 3,
            hour: 19,
            minute: 30,
            gender: Gender::F,
        })
        .unwrap();
        let structure = analyze_structure(&pillars);
        let luck = analyze_year_luck(&pillars, 2026, 8);
        (pillars, structure, luck)
    }

    #[test]
    fn tone_detection() {
        assert_eq!(detect_tone("올해 연애운 어때요?"), Tone::Formal);
        assert_eq!(detect_tone("올해 연애운이 궁금합니다"), Tone::Formal);
        assert_eq!(detect_tone("올해 연애운 어때?"), Tone::Casual);
    }

    #[test]
    fn date_is_injected() {
        let (pillars, structure, luck) = fixtures();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let pkg = first_reading(&pillars, &structure, &luck, now);
        assert!(pkg.system.contains("2026년 8월 1일"));
    }

    #[test]
    fn year_yukchin_is_hardcoded_constant() {
        let (pillars, structure, luck) = fixtures();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let pkg = general_question("올해 운세는?", &pillars, &structure, &luck, &[], now);
        assert!(pkg.user.contains("다시 계산하지 말 것"));
        assert!(pkg.user.contains(luck.year_stem_yukchin.korean()));
    }

    #[test]
    fn paid_tracks_demand_tags() {
        let (pillars, structure, luck) = fixtures();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let pkg = general_question("취업운 봐줘", &pillars, &structure, &luck, &[], now);
        assert!(pkg.system.contains("[FREE]"));
        assert!(pkg.system.contains("[PREMIUM]"));
        // The interim package must not carry the freemium rule.
        let interim_pkg = interim("취업운 봐줘", now);
        assert!(!interim_pkg.system.contains("[FREE]"));
        assert_eq!(interim_pkg.max_tokens, INTERIM_MAX_TOKENS);
    }

    #[test]
    fn classics_are_embedded_when_present() {
        let (pillars, structure, luck) = fixtures();
        let now = FixedClock::at(2026, 8, 1, 9, 0).now_kst();
        let chunks = vec!["적천수: 갑목은 하늘을 찌른다".to_string()];
        let pkg = general_question("성격이 궁금해요", &pillars, &structure, &luck, &chunks, now);
        assert!(pkg.user.contains("적천수"));
    }
}
