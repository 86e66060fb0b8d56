use std::fmt;
use std::ops::Range;

use super::stream::{ArgumentStream, Cursor};
use crate::types::{Named, TypeTag, Value};

/// An interpreted token: its value, where it came from and the raw text it
/// was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub value: Value,
    pub tag: TypeTag,
    pub raw: String,
    /// Raw token positions covered, end exclusive.
    pub span: Range<usize>,
}

impl Token {
    pub(crate) fn new(
        value: Value,
        stream: &ArgumentStream<'_>,
        start: Cursor,
        end: Cursor,
    ) -> Self {
        let span = start.position()..end.position();
        Self {
            tag: value.tag(),
            raw: stream.join(span.clone()),
            value,
            span,
        }
    }

    pub fn is_named(&self) -> bool {
        self.tag.is_named()
    }

    pub fn named(&self) -> Option<&Named> {
        self.value.as_named()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
