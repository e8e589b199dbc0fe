//! Kakao bubble splitter: at most 3 simpleText bubbles of at most 1,000
//! characters each, split on natural boundaries (`\n\n` > `\n` > `. ` >
//! space). Residual content beyond the third bubble's capacity is trimmed.

pub const MAX_BUBBLE_CHARS: usize = 1000;
pub const MAX_BUBBLES: usize = 3;

pub fn split_bubbles(text: &str) -> Vec<String> {
    let mut bubbles = Vec::new();
    let mut rest = text.trim();

    while !rest.is_empty() && bubbles.len() < MAX_BUBBLES {
        let is_last = bubbles.len() == MAX_BUBBLES - 1;
        if char_len(rest) <= MAX_BUBBLE_CHARS {
            bubbles.push(rest.to_string());
            break;
        }
        if is_last {
            // Everything left lands in the final bubble, capped at the limit.
            bubbles.push(truncate_chars(rest, MAX_BUBBLE_CHARS));
            break;
        }

        let window_end = byte_index_of_char(rest, MAX_BUBBLE_CHARS);
        let window = &rest[..window_end];
        let cut = find_boundary(window).unwrap_or(window_end);
        let (head, tail) = rest.split_at(cut);
        let head = head.trim_end();
        if head.is_empty() {
            // Boundary degenerated to the very start — hard cut instead.
            bubbles.push(window.to_string());
            rest = rest[window_end..].trim_start();
        } else {
            bubbles.push(head.to_string());
            rest = tail.trim_start();
        }
    }

    if bubbles.is_empty() {
        bubbles.push(String::new());
    }
    bubbles
}

/// Best split position inside the window: paragraph break, then line break,
/// then sentence end, then any space.
fn find_boundary(window: &str) -> Option<usize> {
    if let Some(i) = window.rfind("\n\n") {
        return Some(i);
    }
    if let Some(i) = window.rfind('\n') {
        return Some(i);
    }
    if let Some(i) = window.rfind(". ") {
        return Some(i + 1);
    }
    window.rfind(' ')
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index right after the n-th char (or the full length).
fn byte_index_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn truncate_chars(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

/// Whitespace-normalized form used to check the splitter loses nothing.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_bubble() {
        let out = split_bubbles("오늘의 운세입니다.");
        assert_eq!(out, vec!["오늘의 운세입니다.".to_string()]);
    }

    #[test]
    fn bubble_count_and_size_limits_hold() {
        let paragraph = "운세 문장입니다. ".repeat(120); // well over 1000 chars
        let out = split_bubbles(&paragraph);
        assert!(out.len() <= MAX_BUBBLES);
        for b in &out {
            assert!(b.chars().count() <= MAX_BUBBLE_CHARS, "bubble too long");
        }
    }

    #[test]
    fn content_is_preserved_modulo_whitespace() {
        // Three paragraphs, comfortably under the 3 × 1000 capacity.
        let text = format!(
            "{}\n\n{}\n\n{}",
            "첫 문단입니다. ".repeat(50),
            "둘째 문단입니다. ".repeat(50),
            "셋째 문단입니다. ".repeat(50)
        );
        let out = split_bubbles(&text);
        assert!(out.len() <= 3);
        let rejoined = normalize_ws(&out.join(" "));
        assert_eq!(rejoined, normalize_ws(&text));
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let a = "가".repeat(600);
        let b = "나".repeat(600);
        let text = format!("{}\n\n{}", a, b);
        let out = split_bubbles(&text);
        assert_eq!(out.len(), 2);
        assert!(out[0].chars().all(|c| c == '가'));
        assert!(out[1].chars().all(|c| c == '나'));
    }

    #[test]
    fn multibyte_hard_cut_is_char_safe() {
        // No spaces or newlines at all — forces hard cuts on char boundaries.
        let text = "한".repeat(2500);
        let out = split_bubbles(&text);
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].chars().count(), MAX_BUBBLE_CHARS);
        assert_eq!(out[1].chars().count(), MAX_BUBBLE_CHARS);
        assert_eq!(out[2].chars().count(), 500);
    }

    #[test]
    fn empty_input_yields_single_empty_bubble() {
        assert_eq!(split_bubbles(""), vec![String::new()]);
        assert_eq!(split_bubbles("   "), vec![String::new()]);
    }
}
