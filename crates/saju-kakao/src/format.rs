//! Kakao has no rich formatting: Markdown coming out of the orchestrator is
//! flattened to plain text before bubble splitting.

pub fn flatten_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();

        // Code fences: drop the fence markers, keep the code as plain lines.
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            out.push_str(line);
            out.push('\n');
            continue;
        }

        // Headers become bracketed titles.
        if let Some(header) = trimmed.strip_prefix("### ") {
            out.push_str(&format!("[{}]\n", strip_inline(header)));
            continue;
        }
        if let Some(header) = trimmed
            .strip_prefix("## ")
            .or_else(|| trimmed.strip_prefix("# "))
        {
            out.push_str(&format!("[{}]\n", strip_inline(header)));
            continue;
        }

        out.push_str(&strip_inline(line));
        out.push('\n');
    }

    out.trim_end().to_string()
}

/// Remove bold/italic/code markers, keeping the content.
fn strip_inline(line: &str) -> String {
    line.replace("**", "")
        .replace("__", "")
        .replace('*', "")
        .replace('`', "")
        .replace('_', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_and_italic_markers_are_removed() {
        assert_eq!(flatten_markdown("*굵게* 그리고 _기울임_"), "굵게 그리고 기울임");
        assert_eq!(flatten_markdown("**강조** 텍스트"), "강조 텍스트");
    }

    #[test]
    fn headers_become_bracketed() {
        assert_eq!(flatten_markdown("### 오늘의 운세"), "[오늘의 운세]");
        assert_eq!(flatten_markdown("# 제목"), "[제목]");
    }

    #[test]
    fn code_fences_are_unwrapped() {
        let text = "설명\n```\n코드 내용\n```\n끝";
        assert_eq!(flatten_markdown(text), "설명\n코드 내용\n끝");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(flatten_markdown("그냥 평범한 글"), "그냥 평범한 글");
    }
}
