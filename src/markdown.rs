fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Convert the markdown subset used in bot replies (bold, italic, inline
/// code) to Telegram HTML.
pub fn markdown_to_html(text: &str) -> String {
    // Use null character as delimiter for placeholders so later passes never
    // touch code content
    const PH: char = '\x00';

    // Extract inline code first
    let mut inline_codes: Vec<String> = Vec::new();
    let mut processed = {
        let re = regex::Regex::new(r"`([^`]+)`").unwrap();
        re.replace_all(text, |caps: &regex::Captures| {
            let idx = inline_codes.len();
            let code = caps.get(1).map_or("", |m| m.as_str());
            inline_codes.push(format!("<code>{}</code>", escape_html(code)));
            format!("{PH}INLINE_CODE_{idx}{PH}")
        })
        .into_owned()
    };

    // Escape HTML in remaining text
    processed = escape_html(&processed);

    // Bold: **text** or __text__
    let re = regex::Regex::new(r"\*\*([^*]+)\*\*").unwrap();
    processed = re.replace_all(&processed, "<b>$1</b>").into_owned();
    let re = regex::Regex::new(r"__([^_]+)__").unwrap();
    processed = re.replace_all(&processed, "<b>$1</b>").into_owned();

    // Italic: *text* or _text_ (bold ** already processed above)
    let re = regex::Regex::new(r"\*([^*]+)\*").unwrap();
    processed = re.replace_all(&processed, "<i>$1</i>").into_owned();
    let re = regex::Regex::new(r"\b_([^_]+)_\b").unwrap();
    processed = re.replace_all(&processed, "<i>$1</i>").into_owned();

    // Restore inline code
    for (i, code) in inline_codes.iter().enumerate() {
        processed = processed.replace(&format!("{PH}INLINE_CODE_{i}{PH}"), code);
    }

    processed
}

/// Plain-text rendering for the fallback send when Telegram rejects the
/// HTML variant.
pub fn strip_markdown(text: &str) -> String {
    let mut result = text.to_string();

    // Remove inline code backticks
    let re = regex::Regex::new(r"`([^`]+)`").unwrap();
    result = re.replace_all(&result, "$1").into_owned();

    // Remove bold
    let re = regex::Regex::new(r"\*\*([^*]+)\*\*").unwrap();
    result = re.replace_all(&result, "$1").into_owned();
    let re = regex::Regex::new(r"__([^_]+)__").unwrap();
    result = re.replace_all(&result, "$1").into_owned();

    // Remove italic
    let re = regex::Regex::new(r"\*([^*]+)\*").unwrap();
    result = re.replace_all(&result, "$1").into_owned();
    let re = regex::Regex::new(r"_([^_]+)_").unwrap();
    result = re.replace_all(&result, "$1").into_owned();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold() {
        assert_eq!(markdown_to_html("**bold**"), "<b>bold</b>");
        assert_eq!(markdown_to_html("__bold__"), "<b>bold</b>");
    }

    #[test]
    fn test_italic() {
        assert_eq!(markdown_to_html("*italic*"), "<i>italic</i>");
        assert_eq!(markdown_to_html("_italic_"), "<i>italic</i>");
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(markdown_to_html("`1234`"), "<code>1234</code>");
    }

    #[test]
    fn test_html_escaping() {
        assert_eq!(markdown_to_html("<script>"), "&lt;script&gt;");
    }

    #[test]
    fn test_code_content_not_formatted() {
        assert_eq!(
            markdown_to_html("`**nick**`"),
            "<code>**nick**</code>"
        );
    }

    #[test]
    fn test_mixed_reply_line() {
        assert_eq!(
            markdown_to_html("**Name:** `Shadow & co`"),
            "<b>Name:</b> <code>Shadow &amp; co</code>"
        );
    }

    #[test]
    fn test_strip_markdown() {
        assert_eq!(strip_markdown("**Name:** `Shadow`"), "Name: Shadow");
        assert_eq!(strip_markdown("_italic_ and __bold__"), "italic and bold");
    }

    #[test]
    fn test_plain_text_unchanged() {
        assert_eq!(markdown_to_html("hello world"), "hello world");
    }
}
