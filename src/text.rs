//! Text helpers shared by the router and the engines.
//!
//! [`escape_log`] keeps user-supplied words single-line in the log file, and
//! [`sanitize_mentions`] defuses mass mentions before a reply is handed to the chat client.

use std::fmt::Write;

/// Longest user string copied into a log line.
const LOG_PREVIEW_CHARS: usize = 120;

/// Escape control characters and cap the length of a user string for logging.
pub fn escape_log(s: &str) -> String {
    let mut out = String::with_capacity(s.len().min(LOG_PREVIEW_CHARS) + 4);
    for (i, ch) in s.chars().enumerate() {
        if i == LOG_PREVIEW_CHARS {
            out.push('…');
            break;
        }
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{{{:x}}}", c as u32);
            }
            c => out.push(c),
        }
    }
    out
}

/// Insert a zero-width space after `@` in `@everyone` and `@here` so echoed text cannot
/// ping a whole server.
pub fn sanitize_mentions(s: &str) -> String {
    const ZWSP: &str = "\u{200B}";
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('@') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos + 1..];
        out.push('@');
        if starts_with_ignore_case(tail, "everyone") || starts_with_ignore_case(tail, "here") {
            out.push_str(ZWSP);
        }
        rest = tail;
    }
    out.push_str(rest);
    out
}

fn starts_with_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack
        .get(..needle.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(needle))
}
