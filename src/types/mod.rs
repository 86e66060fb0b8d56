//! Value kinds understood by the command engine, the tags identifying them and
//! the values produced when a raw chat token is interpreted.
//!
//! The catalog is closed: every kind has exactly one interpreter (see
//! [`crate::parse::interpreter`]) and each kind also exists as a *named*
//! wrapper, produced from `--name value` pairs.

pub mod flag;
pub mod quote;

use std::fmt;

pub use flag::{Capability, GlobalFlag};
pub use quote::{OPENER_CLOSERS, Quote};

/// One interpretable value kind, listed in parsing priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueKind {
    /// A 64-bit signed integer.
    Integer,
    /// A 64-bit float. Tokens that are integers are claimed by [`ValueKind::Integer`] first.
    Real,
    /// `true` or `false`.
    Boolean,
    /// A member mention, `<@!ID>`.
    Member,
    /// A channel mention, `<#ID>`.
    Channel,
    /// A span of tokens delimited by an opener/closer pair.
    Quote,
    /// The catch-all. Always succeeds, so it must be tried last.
    Text,
}

impl ValueKind {
    /// Every kind, in the order the default registry tries them.
    pub const ALL: [ValueKind; 7] = [
        ValueKind::Integer,
        ValueKind::Real,
        ValueKind::Boolean,
        ValueKind::Member,
        ValueKind::Channel,
        ValueKind::Quote,
        ValueKind::Text,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ValueKind::Integer => "Integer",
            ValueKind::Real => "Real",
            ValueKind::Boolean => "Boolean",
            ValueKind::Member => "Member",
            ValueKind::Channel => "Channel",
            ValueKind::Quote => "Quote",
            ValueKind::Text => "String",
        }
    }

    /// Whether this kind accepts any token.
    pub fn is_catch_all(&self) -> bool {
        matches!(self, ValueKind::Text)
    }
}

/// Identity of a parameter or token type.
///
/// Two tags are equal when they describe the same logical type; a named
/// wrapper never equals its plain counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeTag {
    Value(ValueKind),
    Named(ValueKind),
}

impl TypeTag {
    pub const INTEGER: TypeTag = TypeTag::Value(ValueKind::Integer);
    pub const REAL: TypeTag = TypeTag::Value(ValueKind::Real);
    pub const BOOLEAN: TypeTag = TypeTag::Value(ValueKind::Boolean);
    pub const MEMBER: TypeTag = TypeTag::Value(ValueKind::Member);
    pub const CHANNEL: TypeTag = TypeTag::Value(ValueKind::Channel);
    pub const QUOTE: TypeTag = TypeTag::Value(ValueKind::Quote);
    pub const TEXT: TypeTag = TypeTag::Value(ValueKind::Text);

    /// The named wrapper of `kind`.
    pub const fn named(kind: ValueKind) -> TypeTag {
        TypeTag::Named(kind)
    }

    pub fn is_named(&self) -> bool {
        matches!(self, TypeTag::Named(_))
    }

    /// The wrapped kind, for plain and named tags alike.
    pub fn kind(&self) -> ValueKind {
        match self {
            TypeTag::Value(kind) | TypeTag::Named(kind) => *kind,
        }
    }

    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Value(kind) => f.write_str(kind.label()),
            TypeTag::Named(kind) => write!(f, "Named<{}>", kind.label()),
        }
    }
}

/// Snowflake id of a guild member referenced by a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberId(pub u64);

/// Snowflake id of a text channel referenced by a mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelId(pub u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<@!{}>", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<#{}>", self.0)
    }
}

/// A `--name value` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Named {
    pub name: String,
    pub value: Box<Value>,
}

impl Named {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// Tag of the wrapped value.
    pub fn inner_tag(&self) -> TypeTag {
        self.value.tag()
    }
}

impl fmt::Display for Named {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Named<{}>={}", self.name, self.value)
    }
}

/// A typed value produced by an interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Member(MemberId),
    Channel(ChannelId),
    Quote(Quote),
    Text(String),
    Named(Named),
}

impl Value {
    pub fn tag(&self) -> TypeTag {
        match self {
            Value::Integer(_) => TypeTag::INTEGER,
            Value::Real(_) => TypeTag::REAL,
            Value::Boolean(_) => TypeTag::BOOLEAN,
            Value::Member(_) => TypeTag::MEMBER,
            Value::Channel(_) => TypeTag::CHANNEL,
            Value::Quote(_) => TypeTag::QUOTE,
            Value::Text(_) => TypeTag::TEXT,
            Value::Named(named) => TypeTag::Named(named.value.tag().kind()),
        }
    }

    /// The value itself, or the wrapped value of a named pair.
    pub fn unnamed(&self) -> &Value {
        match self {
            Value::Named(named) => &named.value,
            value => value,
        }
    }

    pub fn as_named(&self) -> Option<&Named> {
        match self {
            Value::Named(named) => Some(named),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.unnamed() {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_real(&self) -> Option<f64> {
        match self.unnamed() {
            Value::Real(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unnamed() {
            Value::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<MemberId> {
        match self.unnamed() {
            Value::Member(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<ChannelId> {
        match self.unnamed() {
            Value::Channel(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_quote(&self) -> Option<&Quote> {
        match self.unnamed() {
            Value::Quote(quote) => Some(quote),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self.unnamed() {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Real(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::Member(id) => write!(f, "{id}"),
            Value::Channel(id) => write!(f, "{id}"),
            Value::Quote(quote) => write!(f, "{}", quote.reconstruct()),
            Value::Text(text) => f.write_str(text),
            Value::Named(named) => write!(f, "{named}"),
        }
    }
}
