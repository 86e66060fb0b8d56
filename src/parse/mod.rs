//! Tokenizing a message body into typed tokens.

pub mod interpreter;
pub mod stream;
pub mod token;

pub use interpreter::{InterpreterRegistry, NAMED_MARKER, NamedInterpreter};
pub use stream::{ArgumentStream, Cursor, EntityLookup, TrustingLookup};
pub use token::Token;
