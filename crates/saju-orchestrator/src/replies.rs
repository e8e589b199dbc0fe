//! User-facing Korean template texts. Everything the orchestrator says
//! without the LLM lives here.

use saju_analysis::interest::InterestCategory;
use saju_core::types::Tier;

pub const WELCOME: &str = "안녕하세요! 사주로 당신의 이야기를 읽어드리는 사주도우미예요 🔮\n\
    생년월일과 태어난 시간, 성별을 알려주시면 바로 풀이를 시작할게요.\n\
    예) 1994년 10월 3일 오후 7시 30분 여성";

pub const ASK_BIRTH: &str = "사주를 보려면 생년월일이 필요해요.\n\
    '1994년 10월 3일 오후 7시 30분 여성' 처럼 알려주세요. \
    태어난 시간을 모르면 날짜와 성별만 적어주셔도 돼요.";

pub const ASK_PARTNER_BIRTH: &str = "궁합을 보려면 상대방의 정보가 필요해요.\n\
    상대방의 생년월일과 태어난 시간, 성별을 알려주세요.\n\
    예) 1995년 3월 15일 오후 2시 남성";

pub const REPROMPT_PARTNER_BIRTH: &str = "상대방 정보를 읽지 못했어요 😅\n\
    '1995년 3월 15일 오후 2시 남성' 형식으로 다시 한번 알려주세요.";

pub const PROFILE_REGISTERED: &str = "프로필 등록 완료! 지금부터 사주를 풀어볼게요 ✨";

pub const PROFILE_RESET: &str = "프로필을 초기화했어요. 생년월일부터 다시 알려주세요.";

pub const PROFILE_NONE: &str = "아직 등록된 프로필이 없어요. 생년월일을 먼저 알려주세요.";

pub const GREETING: &str = "안녕하세요! 오늘은 어떤 운이 궁금하세요? \
    연애운, 재물운, 오늘의 운세 무엇이든 물어보세요 🙂";

pub const CASUAL: &str = "재미있는 얘기네요 🙂 사주 관련해서 궁금한 게 있으면 \
    언제든 물어보세요. '올해 연애운 어때?' 처럼요!";

pub const META_AI: &str = "저는 명리학 고전과 AI를 결합해 사주를 풀어드리는 상담 봇이에요. \
    생년월일만 있으면 성격, 연애운, 재물운, 좋은 날짜까지 봐드려요.";

pub const HARMFUL: &str = "많이 힘드신 것 같아 걱정돼요. 혼자 견디지 마세요.\n\
    자살예방상담전화 1393 (24시간), 정신건강상담전화 1577-0199 에서 \
    언제든 도움을 받을 수 있어요. 당신의 이야기를 들어줄 사람이 있습니다.";

pub const APOLOGY: &str = "오류가 발생했어요";

pub const LLM_DISABLED: &str = "지금은 AI 분석 기능을 사용할 수 없어요. \
    잠시 후 다시 시도해 주세요.";

pub const UNLOCK_LABEL: &str = "🔓 전체 풀이 보기";
pub const UNLOCK_PAYLOAD: &str = "unlock_premium";

pub const NO_PREMIUM_CONTENT: &str = "해제할 프리미엄 풀이가 아직 없어요. \
    먼저 궁금한 운세를 물어봐 주세요!";

pub const NO_FREE_UNLOCKS: &str = "남은 무료 해제권이 없어요 😢\n\
    친구를 초대하면 해제권을 드려요. '초대' 라고 입력해 보세요!";

pub fn rate_limited(retry_after: u64) -> String {
    format!(
        "너무 빨라요! {}초 뒤에 다시 보내주세요 🙏",
        retry_after
    )
}

pub fn quota_exceeded(tier: Tier) -> String {
    match tier {
        Tier::Free => "오늘의 무료 질문을 모두 사용했어요.\n\
            베이직으로 업그레이드하면 하루 10회까지 물어볼 수 있어요 ✨"
            .to_string(),
        Tier::Basic => "오늘 준비된 질문 횟수를 모두 사용했어요.\n\
            프리미엄이라면 제한 없이 대화할 수 있어요 ✨"
            .to_string(),
        Tier::Premium => "오늘은 여기까지만 가능해요. 내일 다시 만나요!".to_string(),
    }
}

pub fn invite_text(code: &str) -> String {
    format!(
        "친구에게 이 코드를 공유하세요!\n\n👉 /start {}\n\n\
         친구가 가입하면 두 분 모두 무료 해제권을 1장씩 받아요 🎁",
        code
    )
}

pub fn apology_with_kind(kind: &str) -> String {
    format!("{} ({})\n잠시 후 다시 시도해 주세요 🙏", APOLOGY, kind)
}

/// Category-specific teaser line shown under the blurred premium section.
pub fn teaser_for(category: InterestCategory) -> &'static str {
    match category {
        InterestCategory::Love => "💘 결정적인 인연의 시기는 프리미엄에서 확인할 수 있어요",
        InterestCategory::Money => "💰 돈이 들어오는 달은 프리미엄에서 공개돼요",
        InterestCategory::Career => "💼 이직의 최적 타이밍은 프리미엄에 담겨 있어요",
        InterestCategory::Health => "🍀 조심해야 할 시기는 프리미엄에서 알려드려요",
        InterestCategory::Study => "📚 합격운이 가장 강한 시기는 프리미엄에 있어요",
        InterestCategory::Family => "🏠 가족운의 전환점은 프리미엄에서 확인하세요",
        InterestCategory::Moving => "🚚 이사하기 좋은 날짜는 프리미엄에서 공개돼요",
        InterestCategory::Business => "📈 사업 확장의 적기는 프리미엄에 담겨 있어요",
        InterestCategory::General => "🔮 핵심 조언과 시기는 프리미엄에서 확인할 수 있어요",
    }
}

/// Fixed progress-edit stage labels, advanced every two seconds.
pub const PROGRESS_STAGES: [&str; 5] = [
    "사주 명식 계산 중...",
    "오행의 균형을 살피는 중...",
    "올해 세운과 대조하는 중...",
    "고전 구절을 찾아보는 중...",
    "거의 다 됐어요...",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsell_differs_by_tier() {
        assert_ne!(quota_exceeded(Tier::Free), quota_exceeded(Tier::Basic));
    }

    #[test]
    fn teaser_exists_for_every_category() {
        for cat in InterestCategory::all() {
            assert!(!teaser_for(cat).is_empty());
        }
    }

    #[test]
    fn progress_stages_are_fixed_sequence() {
        assert_eq!(PROGRESS_STAGES.len(), 5);
        assert!(PROGRESS_STAGES[0].contains("명식"));
        assert!(PROGRESS_STAGES[4].contains("거의"));
    }
}
