//! Day-pillar hallucination correction.
//!
//! LLMs occasionally name the wrong day pillar ("갑자일" when the chart says
//! 무진). Any of the 60 known "{ganzi}일" tokens that differs from the
//! computed one is string-replaced; nothing else is touched.

use saju_pillars::tables::ganzi_name;
use saju_pillars::types::Pillar;

pub fn correct_day_pillar(text: &str, actual: Pillar) -> String {
    let correct_token = format!("{}일", actual.name());
    let mut out = text.to_string();
    for n in 0..60 {
        let token = format!("{}일", ganzi_name(n));
        if token != correct_token && out.contains(&token) {
            out = out.replace(&token, &correct_token);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mujin() -> Pillar {
        Pillar::parse("무진").unwrap()
    }

    #[test]
    fn wrong_day_pillar_is_replaced() {
        let fixed = correct_day_pillar("당신의 일주는 갑자일입니다.", mujin());
        assert_eq!(fixed, "당신의 일주는 무진일입니다.");
    }

    #[test]
    fn correct_token_is_untouched() {
        let text = "무진일의 기운은 듬직합니다.";
        assert_eq!(correct_day_pillar(text, mujin()), text);
    }

    #[test]
    fn unrelated_il_suffix_not_mutated() {
        // "내일", "요일", "생일" are not ganzi tokens.
        let text = "내일은 월요일, 생일 축하할 일이 있어요.";
        assert_eq!(correct_day_pillar(text, mujin()), text);
    }

    #[test]
    fn multiple_wrong_tokens_all_replaced() {
        let fixed = correct_day_pillar("갑자일과 을축일 모두 아닙니다.", mujin());
        assert!(!fixed.contains("갑자일"));
        assert!(!fixed.contains("을축일"));
        assert!(fixed.contains("무진일"));
    }
}
