//! Interpreters turning raw tokens into typed values, and the ordered
//! registries trying them.
//!
//! Every interpreter follows the same contract: on success it returns the
//! value and moves the cursor past what it consumed; on failure it returns
//! `None` and leaves the cursor where it was, so a failed attempt costs nothing
//! and the next interpreter starts from the same position.

use lazy_static::lazy_static;
use regex::Regex;

use super::stream::{ArgumentStream, Cursor};
use super::token::Token;
use crate::types::{ChannelId, GlobalFlag, MemberId, Named, TypeTag, Value, ValueKind, quote};

/// Marker introducing a named argument.
pub const NAMED_MARKER: &str = "--";

lazy_static! {
    static ref MEMBER_RE: Regex = Regex::new(r"^<@!(\d+)>$").expect("Invalid Regex");
    static ref CHANNEL_RE: Regex = Regex::new(r"^<#(\d+)>$").expect("Invalid Regex");
}

impl ValueKind {
    /// Attempts to read one value of this kind at `cursor`.
    pub fn interpret(self, stream: &ArgumentStream<'_>, cursor: &mut Cursor) -> Option<Value> {
        let raw = stream.get(cursor.position())?;
        let value = match self {
            ValueKind::Integer => Value::Integer(raw.parse().ok()?),
            ValueKind::Real => {
                // `inf` and `NaN` parse as floats but are not numbers a user types.
                if !raw.bytes().any(|b| b.is_ascii_digit()) {
                    return None;
                }
                Value::Real(raw.parse().ok()?)
            }
            ValueKind::Boolean => match raw {
                "true" => Value::Boolean(true),
                "false" => Value::Boolean(false),
                _ => return None,
            },
            ValueKind::Member => {
                let id = MemberId(capture_id(&MEMBER_RE, raw)?);
                if !stream.lookup().member_exists(id) {
                    return None;
                }
                Value::Member(id)
            }
            ValueKind::Channel => {
                let id = ChannelId(capture_id(&CHANNEL_RE, raw)?);
                if !stream.lookup().channel_exists(id) {
                    return None;
                }
                Value::Channel(id)
            }
            // Quotes may span several tokens and move the cursor themselves.
            ValueKind::Quote => return quote::interpret(stream, cursor).map(Value::Quote),
            ValueKind::Text => Value::Text(raw.to_string()),
        };
        cursor.advance(1);
        Some(value)
    }
}

fn capture_id(re: &Regex, raw: &str) -> Option<u64> {
    re.captures(raw)?.get(1)?.as_str().parse().ok()
}

/// One entry of the named registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedInterpreter {
    /// `--<global flag>`, always a switch set to `true`.
    GlobalFlag,
    /// `--name value` where `value` is read by the kind's interpreter. The
    /// boolean kind also reads bare switches.
    Kind(ValueKind),
}

impl NamedInterpreter {
    pub fn interpret(self, stream: &ArgumentStream<'_>, cursor: &mut Cursor) -> Option<Value> {
        match self {
            NamedInterpreter::GlobalFlag => interpret_global_flag(stream, cursor),
            NamedInterpreter::Kind(ValueKind::Boolean) => interpret_switch(stream, cursor),
            NamedInterpreter::Kind(kind) => interpret_named(kind, stream, cursor),
        }
    }

    pub fn tag(self) -> TypeTag {
        match self {
            NamedInterpreter::GlobalFlag => TypeTag::named(ValueKind::Boolean),
            NamedInterpreter::Kind(kind) => TypeTag::named(kind),
        }
    }
}

fn flag_name<'a>(stream: &ArgumentStream<'a>, cursor: Cursor) -> Option<&'a str> {
    stream.get(cursor.position())?.strip_prefix(NAMED_MARKER)
}

fn interpret_global_flag(stream: &ArgumentStream<'_>, cursor: &mut Cursor) -> Option<Value> {
    let name = flag_name(stream, *cursor)?;
    let flag = GlobalFlag::from_name(name)?;
    cursor.advance(1);
    Some(Value::Named(Named::new(flag.name(), Value::Boolean(true))))
}

fn interpret_named(
    kind: ValueKind,
    stream: &ArgumentStream<'_>,
    cursor: &mut Cursor,
) -> Option<Value> {
    let name = flag_name(stream, *cursor)?;
    let mut inner = cursor.ahead(1);
    if stream.is_exhausted(inner) {
        return None;
    }
    let value = kind.interpret(stream, &mut inner)?;
    *cursor = inner;
    Some(Value::Named(Named::new(name, value)))
}

/// Named booleans, in order: `--name true|false`; `--name` as the last token;
/// `--name` followed by another named token; `--name` declared as a boolean
/// flag of the invoked command. The last three are switches set to `true`
/// that consume only the `--name` token.
fn interpret_switch(stream: &ArgumentStream<'_>, cursor: &mut Cursor) -> Option<Value> {
    let name = flag_name(stream, *cursor)?;

    let Some(next) = stream.get(cursor.position() + 1) else {
        cursor.advance(1);
        return Some(Value::Named(Named::new(name, Value::Boolean(true))));
    };

    let mut inner = cursor.ahead(1);
    if let Some(value) = ValueKind::Boolean.interpret(stream, &mut inner) {
        *cursor = inner;
        return Some(Value::Named(Named::new(name, value)));
    }

    if next.starts_with(NAMED_MARKER) || stream.is_boolean_flag(name) {
        cursor.advance(1);
        return Some(Value::Named(Named::new(name, Value::Boolean(true))));
    }

    None
}

/// The ordered plain and named interpreter lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterRegistry {
    kinds: Vec<ValueKind>,
    named: Vec<NamedInterpreter>,
}

impl InterpreterRegistry {
    /// A registry over `kinds`, tried in the given order except that the
    /// catch-all, if present, is moved last. The named registry mirrors it with
    /// the global-flag switch and the named boolean first.
    pub fn with_kinds(kinds: impl IntoIterator<Item = ValueKind>) -> Self {
        let mut ordered: Vec<ValueKind> = Vec::new();
        for kind in kinds {
            if !ordered.contains(&kind) {
                ordered.push(kind);
            }
        }
        if let Some(position) = ordered.iter().position(|kind| kind.is_catch_all()) {
            let catch_all = ordered.remove(position);
            ordered.push(catch_all);
        }

        let mut named = vec![NamedInterpreter::GlobalFlag];
        if ordered.contains(&ValueKind::Boolean) {
            named.push(NamedInterpreter::Kind(ValueKind::Boolean));
        }
        named.extend(
            ordered
                .iter()
                .filter(|kind| **kind != ValueKind::Boolean)
                .map(|kind| NamedInterpreter::Kind(*kind)),
        );

        Self {
            kinds: ordered,
            named,
        }
    }

    pub fn kinds(&self) -> &[ValueKind] {
        &self.kinds
    }

    pub fn named(&self) -> &[NamedInterpreter] {
        &self.named
    }

    /// Whether values tagged `tag` can be produced by this registry.
    pub fn supports(&self, tag: TypeTag) -> bool {
        self.kinds.contains(&tag.kind())
    }

    /// Interprets the token at `cursor`, trying the named registry first when
    /// the token starts with `--`. Returns `None` only when nothing accepts
    /// the token, which with the catch-all present means the stream is
    /// exhausted.
    pub fn interpret_next(
        &self,
        stream: &ArgumentStream<'_>,
        cursor: &mut Cursor,
    ) -> Option<Token> {
        let start = *cursor;
        let raw = stream.get(start.position())?;

        if raw.starts_with(NAMED_MARKER) {
            for interpreter in &self.named {
                let mut attempt = start;
                if let Some(value) = interpreter.interpret(stream, &mut attempt) {
                    *cursor = attempt;
                    return Some(Token::new(value, stream, start, attempt));
                }
            }
        }

        for kind in &self.kinds {
            let mut attempt = start;
            if let Some(value) = kind.interpret(stream, &mut attempt) {
                *cursor = attempt;
                return Some(Token::new(value, stream, start, attempt));
            }
        }

        None
    }

    /// Interprets the whole stream. Tokens with empty raw text, left by
    /// repeated separators, are dropped; tokens no interpreter accepts are
    /// skipped.
    pub fn tokenize(&self, stream: &ArgumentStream<'_>) -> Vec<Token> {
        let mut cursor = Cursor::default();
        let mut tokens = Vec::new();

        while !stream.is_exhausted(cursor) {
            match self.interpret_next(stream, &mut cursor) {
                Some(token) if token.raw.is_empty() => {}
                Some(token) => tokens.push(token),
                None => {
                    tracing::warn!(
                        token = stream.get(cursor.position()).unwrap_or_default(),
                        "no interpreter accepts token, skipping"
                    );
                    cursor.advance(1);
                }
            }
        }

        tokens
    }
}

impl Default for InterpreterRegistry {
    fn default() -> Self {
        Self::with_kinds(ValueKind::ALL)
    }
}
