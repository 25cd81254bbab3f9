//! Message rendering
//!
//! Turns message content into display markup. Fenced regions delimited by a
//! pair of triple backticks become `<pre><code>` blocks; everything is HTML
//! escaped because backend text is untrusted.

use std::sync::OnceLock;

use regex::Regex;

use crate::conversation::ConversationMessage;

const FENCE: &str = "```";

fn fence_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"```([\s\S]*?)```").expect("fence pattern is valid"))
}

fn char_reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);")
            .expect("character reference pattern is valid")
    })
}

/// Render one message body to markup.
///
/// Fences are matched non-greedily, so `a ```x``` b ```y``` c` yields two
/// code blocks. An unmatched trailing fence is left as text.
pub fn render(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 32);
    let mut cursor = 0;

    for fenced in fence_pattern().find_iter(content) {
        out.push_str(&escape_html(&content[cursor..fenced.start()]));

        let inner = &content[fenced.start() + FENCE.len()..fenced.end() - FENCE.len()];
        out.push_str("<pre><code>");
        out.push_str(&escape_html(inner));
        out.push_str("</code></pre>");

        cursor = fenced.end();
    }

    out.push_str(&escape_html(&content[cursor..]));
    out
}

/// Render a message as a chat bubble
pub fn render_message(message: &ConversationMessage) -> String {
    format!(
        r#"<div class="message {}-message">{}</div>"#,
        message.role.as_str(),
        render(&message.content)
    )
}

/// Render the whole transcript, oldest first
pub fn render_history(messages: &[ConversationMessage]) -> String {
    messages.iter().map(render_message).collect()
}

/// Escape HTML special characters. An `&` that already begins a well-formed
/// character reference is kept, which makes escaping idempotent.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            '&' if char_reference_pattern().is_match(&text[i..]) => result.push('&'),
            '&' => result.push_str("&amp;"),
            _ => result.push(c),
        }
    }
    result
}
