use std::ops::Range;

use crate::types::{ChannelId, MemberId};

/// Resolves whether referenced chat entities exist.
pub trait EntityLookup {
    fn member_exists(&self, member: MemberId) -> bool;
    fn channel_exists(&self, channel: ChannelId) -> bool;
}

/// Lookup accepting every reference, for offline parsing and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustingLookup;

impl EntityLookup for TrustingLookup {
    fn member_exists(&self, _member: MemberId) -> bool {
        true
    }

    fn channel_exists(&self, _channel: ChannelId) -> bool {
        true
    }
}

/// Position of the next raw token to interpret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor(usize);

impl Cursor {
    pub fn new(position: usize) -> Self {
        Self(position)
    }

    pub fn position(&self) -> usize {
        self.0
    }

    pub fn advance(&mut self, tokens: usize) {
        self.0 += tokens;
    }

    /// A cursor `tokens` further, leaving `self` as is.
    pub fn ahead(&self, tokens: usize) -> Cursor {
        Cursor(self.0 + tokens)
    }
}

/// The raw tokens of one invocation plus what interpreters need to read them.
pub struct ArgumentStream<'a> {
    args: Vec<&'a str>,
    separator: &'a str,
    lookup: &'a dyn EntityLookup,
    boolean_flags: &'a [String],
}

impl<'a> ArgumentStream<'a> {
    pub fn new(args: Vec<&'a str>, separator: &'a str, lookup: &'a dyn EntityLookup) -> Self {
        Self {
            args,
            separator,
            lookup,
            boolean_flags: &[],
        }
    }

    /// Splits `input` on every occurrence of `separator`. Repeated separators
    /// yield empty tokens so quoted spans keep the exact spacing.
    pub fn split(input: &'a str, separator: &'a str, lookup: &'a dyn EntityLookup) -> Self {
        let args = if input.is_empty() || separator.is_empty() {
            if input.is_empty() { Vec::new() } else { vec![input] }
        } else {
            input.split(separator).collect()
        };
        Self::new(args, separator, lookup)
    }

    /// Flag names declared as named booleans by the invoked command tree. A
    /// `--name` spelled with one of these is a switch even when followed by a
    /// non-boolean token.
    pub fn with_boolean_flags(mut self, names: &'a [String]) -> Self {
        self.boolean_flags = names;
        self
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.args.get(index).copied()
    }

    pub fn separator(&self) -> &'a str {
        self.separator
    }

    pub fn lookup(&self) -> &'a dyn EntityLookup {
        self.lookup
    }

    pub fn is_boolean_flag(&self, name: &str) -> bool {
        self.boolean_flags.iter().any(|flag| flag == name)
    }

    /// The raw text of `span`, re-joined with the separator.
    pub fn join(&self, span: Range<usize>) -> String {
        let end = span.end.min(self.args.len());
        let start = span.start.min(end);
        self.args[start..end].join(self.separator)
    }

    pub fn is_exhausted(&self, cursor: Cursor) -> bool {
        cursor.position() >= self.args.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_keeps_empty_tokens() {
        let stream = ArgumentStream::split("a  b", " ", &TrustingLookup);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.get(1), Some(""));
        assert_eq!(stream.join(0..3), "a  b");
    }

    #[test]
    fn test_split_empty_input_has_no_tokens() {
        let stream = ArgumentStream::split("", " ", &TrustingLookup);
        assert!(stream.is_empty());
        assert!(stream.is_exhausted(Cursor::default()));
    }

    #[test]
    fn test_custom_separator() {
        let stream = ArgumentStream::split("1;2;three", ";", &TrustingLookup);
        assert_eq!(stream.len(), 3);
        assert_eq!(stream.join(1..3), "2;three");
    }

    #[test]
    fn test_join_clamps_span() {
        let stream = ArgumentStream::split("a b", " ", &TrustingLookup);
        assert_eq!(stream.join(1..10), "b");
        assert_eq!(stream.join(5..10), "");
    }
}
