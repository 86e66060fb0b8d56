//! Quoted spans: runs of tokens bounded by an opener/closer pair, used to pass
//! text containing the separator as a single argument.

use std::fmt;

use crate::parse::{ArgumentStream, Cursor};

/// Recognized opener/closer pairs. Order matters: `**` must be tried before `*`.
pub const OPENER_CLOSERS: [(&str, &str); 9] = [
    ("`", "`"),
    ("**", "**"),
    ("{", "}"),
    ("[", "]"),
    ("*", "*"),
    ("(", ")"),
    ("_", "_"),
    ("\"", "\""),
    ("'", "'"),
];

/// The opener/closer pair whose opener starts `raw`.
pub fn opener_of(raw: &str) -> Option<(&'static str, &'static str)> {
    OPENER_CLOSERS
        .iter()
        .copied()
        .find(|(opener, _)| raw.starts_with(opener))
}

/// A quoted message with the delimiters it was written with.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Quote {
    pub message: String,
    pub opener: &'static str,
    pub closer: &'static str,
}

impl Quote {
    pub fn new(message: impl Into<String>, opener: &'static str, closer: &'static str) -> Self {
        Self {
            message: message.into(),
            opener,
            closer,
        }
    }

    /// The delimited text as it was typed.
    pub fn reconstruct(&self) -> String {
        format!("{}{}{}", self.opener, self.message, self.closer)
    }

    /// Rendering safe to post back in chat: every delimiter character is
    /// backslash-escaped so it is not taken as markdown.
    pub fn to_chat_string(&self) -> String {
        let escape = |delimiter: &str| -> String {
            delimiter.chars().flat_map(|c| ['\\', c]).collect()
        };
        format!(
            "{{content={}, opener={}, closer={}}}",
            self.message,
            escape(self.opener),
            escape(self.closer)
        )
    }
}

impl fmt::Display for Quote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Interprets a quoted span starting at `cursor`.
///
/// A token closes the span when it ends with the closer and is either longer
/// than the closer or not the opening token, so a lone `` ` `` never closes on
/// itself. Leaves `cursor` untouched when no closing token is found.
pub(crate) fn interpret(stream: &ArgumentStream<'_>, cursor: &mut Cursor) -> Option<Quote> {
    let start = cursor.position();
    let (opener, closer) = opener_of(stream.get(start)?)?;

    for end in start..stream.len() {
        let token = stream.get(end)?;
        if !token.ends_with(closer) || (token.len() <= closer.len() && end == start) {
            continue;
        }

        let joined = stream.join(start..end + 1);
        // `***` opens with `**` and ends with `**` but holds no message.
        if joined.len() < opener.len() + closer.len() {
            continue;
        }

        let message = &joined[opener.len()..joined.len() - closer.len()];
        *cursor = Cursor::new(end + 1);
        return Some(Quote::new(message, opener, closer));
    }

    None
}
