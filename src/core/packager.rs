// src/core/packager.rs

//! Turns an [`ActionResult`] into exactly one [`OutboundMessage`].
//!
//! Text is rendered as Telegram MarkdownV2: a status marker and bold headline,
//! followed by the body either as escaped prose or inside a fixed-width code
//! block. Bodies that would push the message past the transport limit are
//! truncated with a visible notice. File payloads pass through as file deliveries.

use crate::core::commands::command_trait::ActionResult;
use crate::core::protocol::OutboundMessage;

/// Telegram rejects messages longer than this many characters.
pub const TRANSPORT_TEXT_LIMIT: usize = 4096;

pub const SUCCESS_MARKER: &str = "✅";
pub const FAILURE_MARKER: &str = "❌";
pub const DENIED_MARKER: &str = "⛔";

const TRUNCATION_NOTICE: &str = "\n… (truncated)";

/// Returns true if `output` can be sent inline under `ceiling`.
///
/// Length is measured in characters, and a body exactly at the ceiling is inline.
pub fn fits_inline(output: &str, ceiling: usize) -> bool {
    output.chars().count() <= ceiling
}

/// Returns true if `output` can be sent inline under `headline` without losing any of it.
///
/// The raw output must fit under `ceiling`, and the rendered message (marker,
/// escaped headline, code fence and escaped body) must fit the transport limit.
/// Escaping grows backslash- and backtick-heavy output, so the second check
/// can fail even when the first passes.
pub fn renders_inline(headline: &str, output: &str, ceiling: usize) -> bool {
    fits_inline(output, ceiling) && rendered_len(headline, output) <= TRANSPORT_TEXT_LIMIT
}

/// Length in characters of `package(ActionResult::ok(headline, body))` before any truncation.
fn rendered_len(headline: &str, body: &str) -> usize {
    let head = SUCCESS_MARKER.chars().count() + " **".len() + escape_md(headline).chars().count();
    let fence = CODE_FENCE_OPEN.chars().count() + CODE_FENCE_CLOSE.chars().count();
    head + SECTION_SEPARATOR.len() + fence + escape_code(body.trim_end()).chars().count()
}

/// Packages an action result for delivery.
pub fn package(result: ActionResult) -> OutboundMessage {
    let marker = if result.success {
        SUCCESS_MARKER
    } else {
        FAILURE_MARKER
    };

    if let Some(file) = result.file {
        let caption = if file.caption.is_empty() {
            format!("{marker} {}", result.headline)
        } else {
            format!("{marker} {}\n{}", result.headline, file.caption)
        };
        return OutboundMessage::File {
            path: file.path,
            caption: truncate_plain(&caption, CAPTION_LIMIT),
            transient: file.transient,
        };
    }

    let mut text = format!("{marker} *{}*", escape_md(&result.headline));

    let mut sections: Vec<Section> = Vec::new();
    if !result.body.trim().is_empty() {
        sections.push(Section {
            content: result.body.trim_end().to_string(),
            preformatted: result.preformatted,
        });
    }
    if let Some(detail) = result.error.as_deref() {
        let detail = detail.trim();
        if !detail.is_empty() {
            sections.push(Section {
                content: detail.to_string(),
                preformatted: true,
            });
        }
    }

    for (i, section) in sections.iter().enumerate() {
        let used = text.chars().count();
        // Later sections reserve a fair share so an error detail survives a long body.
        let remaining_sections = sections.len() - i;
        let room = TRANSPORT_TEXT_LIMIT.saturating_sub(used) / remaining_sections;
        text.push_str(SECTION_SEPARATOR);
        text.push_str(&render_section(
            section,
            room.saturating_sub(SECTION_SEPARATOR.len()),
        ));
    }

    OutboundMessage::markdown(text)
}

/// The response to a command attempt from anyone but the principal.
pub fn access_denied() -> OutboundMessage {
    OutboundMessage::plain(format!("{DENIED_MARKER} Access denied."))
}

/// The response to a command token that matches no registered keyword.
pub fn unknown_command(token: &str, suggestions: &[&str]) -> OutboundMessage {
    let mut text = if token.is_empty() {
        format!("{FAILURE_MARKER} Command not recognized. See /help.")
    } else {
        format!("{FAILURE_MARKER} Command /{token} not recognized. See /help.")
    };
    if !suggestions.is_empty() {
        let list: Vec<String> = suggestions.iter().map(|s| format!("/{s}")).collect();
        text.push_str(&format!("\nDid you mean: {}?", list.join(", ")));
    }
    OutboundMessage::plain(text)
}

/// The response sent when the action itself crashed before producing a result.
pub fn internal_failure(keyword: &str) -> OutboundMessage {
    OutboundMessage::plain(format!(
        "{FAILURE_MARKER} /{keyword} failed unexpectedly. Check the relay logs."
    ))
}

/// Escapes the characters Telegram MarkdownV2 treats as markup.
pub fn escape_md(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + s.len() / 4);
    for c in s.chars() {
        if matches!(
            c,
            '_' | '*'
                | '['
                | ']'
                | '('
                | ')'
                | '~'
                | '`'
                | '>'
                | '#'
                | '+'
                | '-'
                | '='
                | '|'
                | '{'
                | '}'
                | '.'
                | '!'
                | '\\'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escapes text placed inside a MarkdownV2 code block, where only `` ` `` and `\` are special.
pub fn escape_code(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 8);
    for c in s.chars() {
        if c == '`' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

const CAPTION_LIMIT: usize = 1024;
const SECTION_SEPARATOR: &str = "\n\n";
const CODE_FENCE_OPEN: &str = "```\n";
const CODE_FENCE_CLOSE: &str = "\n```";

struct Section {
    content: String,
    preformatted: bool,
}

fn render_section(section: &Section, budget: usize) -> String {
    if section.preformatted {
        let overhead = CODE_FENCE_OPEN.chars().count() + CODE_FENCE_CLOSE.chars().count();
        let escaped = escape_code(&section.content);
        let body = truncate_escaped(&escaped, budget.saturating_sub(overhead), TRUNCATION_NOTICE);
        format!("{CODE_FENCE_OPEN}{body}{CODE_FENCE_CLOSE}")
    } else {
        let notice = escape_md(TRUNCATION_NOTICE);
        truncate_escaped(&escape_md(&section.content), budget, &notice)
    }
}

/// Cuts already-escaped text to at most `max_chars`, appending `notice` if anything
/// was removed. Never leaves a dangling escape backslash at the cut.
fn truncate_escaped(escaped: &str, max_chars: usize, notice: &str) -> String {
    if escaped.chars().count() <= max_chars {
        return escaped.to_string();
    }
    let keep = max_chars.saturating_sub(notice.chars().count());
    let mut cut: String = escaped.chars().take(keep).collect();
    let trailing_backslashes = cut.chars().rev().take_while(|c| *c == '\\').count();
    if trailing_backslashes % 2 == 1 {
        cut.pop();
    }
    cut.push_str(notice);
    cut
}

fn truncate_plain(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(TRUNCATION_NOTICE.chars().count());
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(TRUNCATION_NOTICE);
    cut
}
