use teloxide::prelude::*;
use teloxide::types::{Message, MessageId, ParseMode};

use crate::markdown::{markdown_to_html, strip_markdown};

const MAX_MESSAGE_LENGTH: usize = 4096;

pub fn is_group(msg: &Message) -> bool {
    msg.chat.is_group() || msg.chat.is_supergroup()
}

pub fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().map(|user| user.id.0 as i64)
}

pub fn split_message(text: &str) -> Vec<String> {
    if text.len() <= MAX_MESSAGE_LENGTH {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= MAX_MESSAGE_LENGTH {
            chunks.push(remaining.to_string());
            break;
        }

        // Try to split at newline
        let search_range = &remaining[..MAX_MESSAGE_LENGTH];
        let mut split_index = search_range.rfind('\n').unwrap_or(0);

        if split_index == 0 || split_index < MAX_MESSAGE_LENGTH / 2 {
            // Fall back to space
            split_index = search_range.rfind(' ').unwrap_or(0);
        }

        if split_index == 0 || split_index < MAX_MESSAGE_LENGTH / 2 {
            // Hard split
            split_index = MAX_MESSAGE_LENGTH;
        }

        chunks.push(remaining[..split_index].to_string());
        remaining = remaining[split_index..].trim_start();
    }

    chunks
}

/// Send a markdown reply as Telegram HTML; if Telegram rejects the markup,
/// re-send the same content stripped to plain text.
pub async fn send_html_or_plain(bot: &Bot, chat_id: ChatId, text: &str) -> anyhow::Result<()> {
    for chunk in split_message(text) {
        match bot
            .send_message(chat_id, markdown_to_html(&chunk))
            .parse_mode(ParseMode::Html)
            .await
        {
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("rich reply rejected, falling back to plain text: {e}");
                bot.send_message(chat_id, strip_markdown(&chunk)).await?;
            }
        }
    }
    Ok(())
}

/// Same fallback discipline for editing an existing status message.
pub async fn edit_html_or_plain(
    bot: &Bot,
    chat_id: ChatId,
    message_id: MessageId,
    text: &str,
) -> anyhow::Result<()> {
    match bot
        .edit_message_text(chat_id, message_id, markdown_to_html(text))
        .parse_mode(ParseMode::Html)
        .await
    {
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::warn!("rich reply rejected, falling back to plain text: {e}");
            bot.edit_message_text(chat_id, message_id, strip_markdown(text))
                .await?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_short_message() {
        let chunks = split_message("hello");
        assert_eq!(chunks, vec!["hello"]);
    }

    #[test]
    fn test_split_at_newline() {
        let text = format!("{}\n{}", "a".repeat(3000), "b".repeat(3000));
        let chunks = split_message(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(3000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn test_split_at_space() {
        let text = format!("{} {}", "a".repeat(3000), "b".repeat(3000));
        let chunks = split_message(&text);
        assert_eq!(chunks.len(), 2);
    }

    #[test]
    fn test_split_hard() {
        let text = "a".repeat(5000);
        let chunks = split_message(&text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), MAX_MESSAGE_LENGTH);
    }

    #[test]
    fn test_split_exactly_max() {
        let text = "a".repeat(MAX_MESSAGE_LENGTH);
        let chunks = split_message(&text);
        assert_eq!(chunks.len(), 1);
    }
}
