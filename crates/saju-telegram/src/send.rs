//! Chunked sending with MarkdownV2 escaping and plain-text fallback.
//!
//! Telegram's limit is 4096 characters per message; we use 4090 for safety.

use std::time::Duration;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardMarkup, Message, ParseMode};
use tracing::warn;

use saju_core::error::SajuError;

use crate::error::map_request_error;

const CHUNK_MAX: usize = 4090;

/// Split on line boundaries, force-splitting any single over-long line on a
/// newline/space fallback.
pub fn split_chunks(text: &str) -> Vec<String> {
    if text.len() <= CHUNK_MAX {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    for line in text.split('\n') {
        let cost = if current.is_empty() {
            line.len()
        } else {
            1 + line.len()
        };
        if !current.is_empty() && current.len() + cost > CHUNK_MAX {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    let mut result = Vec::new();
    for chunk in chunks {
        if chunk.len() <= CHUNK_MAX {
            result.push(chunk);
            continue;
        }
        let mut remaining = chunk.as_str();
        while remaining.len() > CHUNK_MAX {
            // Back off to a char boundary before slicing.
            let mut cut = CHUNK_MAX;
            while !remaining.is_char_boundary(cut) {
                cut -= 1;
            }
            let split_at = remaining[..cut]
                .rfind('\n')
                .or_else(|| remaining[..cut].rfind(' '))
                .unwrap_or(cut);
            result.push(remaining[..split_at].to_string());
            remaining = remaining[split_at..].trim_start();
        }
        if !remaining.is_empty() {
            result.push(remaining.to_string());
        }
    }
    result
}

/// Escape the characters MarkdownV2 reserves.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '_' | '*' | '[' | ']' | '(' | ')' | '~' | '`' | '#' | '+' | '-' | '=' | '|' | '{'
            | '}' | '.' | '!' | '>' => {
                out.push('\\');
                out.push(ch);
            }
            _ => out.push(ch),
        }
    }
    out
}

/// Send all chunks; the keyboard (if any) rides on the final chunk. Returns
/// the last sent message for progress editing.
pub async fn send_chunked(
    bot: &Bot,
    chat_id: ChatId,
    text: &str,
    keyboard: Option<InlineKeyboardMarkup>,
) -> Result<Message, SajuError> {
    let chunks = split_chunks(text);
    let last_index = chunks.len() - 1;
    let mut last_message: Option<Message> = None;

    for (i, chunk) in chunks.iter().enumerate() {
        let markup = (i == last_index).then(|| keyboard.clone()).flatten();

        let escaped = escape_markdown_v2(chunk);
        let mut req = bot
            .send_message(chat_id, escaped.as_str())
            .parse_mode(ParseMode::MarkdownV2);
        if let Some(ref kb) = markup {
            req = req.reply_markup(kb.clone());
        }

        let sent = match req.await {
            Ok(m) => m,
            Err(e) => {
                // MarkdownV2 rejected or transient failure — try plain text.
                warn!(error = %e, chunk = i, "MarkdownV2 send failed, falling back to plain");
                let mut plain = bot.send_message(chat_id, chunk.as_str());
                if let Some(kb) = markup {
                    plain = plain.reply_markup(kb);
                }
                plain.await.map_err(map_request_error)?
            }
        };
        last_message = Some(sent);

        if i < last_index {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    last_message.ok_or_else(|| SajuError::Internal("empty send".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_single_chunk() {
        assert_eq!(split_chunks("안녕하세요"), vec!["안녕하세요".to_string()]);
    }

    #[test]
    fn long_text_splits_on_newlines() {
        let line = "가".repeat(1000);
        let text = format!("{}\n{}\n{}", line, line, line);
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
    }

    #[test]
    fn giant_single_line_force_splits() {
        let text = "x".repeat(9000);
        let chunks = split_chunks(&text);
        assert!(chunks.len() >= 2);
        for c in &chunks {
            assert!(c.len() <= CHUNK_MAX);
        }
    }

    #[test]
    fn escape_covers_specials() {
        let escaped = escape_markdown_v2("a.b!c(d)");
        assert_eq!(escaped, "a\\.b\\!c\\(d\\)");
    }
}
