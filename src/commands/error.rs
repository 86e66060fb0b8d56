//! Errors raised while matching an invocation and while registering commands.

use std::fmt;

use thiserror::Error;

use crate::types::{Capability, GlobalFlag, TypeTag};

/// Why a token list does not fit a signature.
///
/// Every `index` is a position in the token list as it was before global
/// flags were extracted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    #[error("wrong argument type")]
    TypeMismatch {
        index: usize,
        expected: TypeTag,
        found: TypeTag,
    },

    #[error("wrong value type for flag `{flag}`")]
    WrongType {
        index: usize,
        flag: String,
        expected: TypeTag,
        found: TypeTag,
    },

    #[error("flag `{name}` does not exist")]
    FlagDoesNotExist { index: usize, name: String },

    #[error("missing permission `{capability}`")]
    PermissionDenied {
        index: usize,
        flags: Vec<String>,
        capability: Capability,
    },

    #[error("global flag `{flag}` is not accepted")]
    GlobalFlagNotAccepted { index: usize, flag: GlobalFlag },

    #[error("incomplete call, missing at least {missing} parameter(s)")]
    IncompleteCall { missing: usize, expected: Vec<TypeTag> },

    #[error("too many arguments")]
    TooManyArguments { index: usize },
}

impl MatchError {
    /// The offending token, when the error is about one.
    pub fn token_index(&self) -> Option<usize> {
        match self {
            MatchError::TypeMismatch { index, .. }
            | MatchError::WrongType { index, .. }
            | MatchError::FlagDoesNotExist { index, .. }
            | MatchError::PermissionDenied { index, .. }
            | MatchError::GlobalFlagNotAccepted { index, .. }
            | MatchError::TooManyArguments { index } => Some(*index),
            MatchError::IncompleteCall { .. } => None,
        }
    }

    fn detail(&self) -> String {
        match self {
            MatchError::TypeMismatch {
                expected, found, ..
            }
            | MatchError::WrongType {
                expected, found, ..
            } => format!("TYPE: {found}\nEXPECTED: {expected}"),
            MatchError::FlagDoesNotExist { name, .. } => {
                format!("FLAG: this named argument does not exist `{name}`.")
            }
            MatchError::PermissionDenied { flags, .. } => {
                format!("FLAG: author does not have permission to use `{flags:?}` flags.")
            }
            MatchError::GlobalFlagNotAccepted { flag, .. } => {
                format!("FLAG: this global flag `{flag}` is not in use here.")
            }
            MatchError::TooManyArguments { .. } => "unexpected argument".to_string(),
            MatchError::IncompleteCall { expected, .. } => {
                let labels: Vec<String> = expected.iter().map(TypeTag::label).collect();
                format!("=> [{}]", labels.join(", "))
            }
        }
    }
}

/// What went wrong in a failed dispatch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FailureKind {
    #[error(transparent)]
    Match(#[from] MatchError),

    /// Every overload failed; the command's own failure comes first.
    #[error("error on an overloaded command: {} total error(s)", .failures.len())]
    OverloadExhausted { failures: Vec<CommandFailure> },
}

/// A failed dispatch together with the call it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Names from the root command down to the failing one.
    pub path: Vec<String>,
    pub prefix: String,
    pub alias: String,
    pub separator: String,
    /// Raw text of each typed token the failing command received.
    pub raw_tokens: Vec<String>,
    pub kind: FailureKind,
}

impl CommandFailure {
    pub fn match_error(&self) -> Option<&MatchError> {
        match &self.kind {
            FailureKind::Match(error) => Some(error),
            FailureKind::OverloadExhausted { .. } => None,
        }
    }

    /// Multi-line report meant to be posted back to the caller.
    pub fn render(&self) -> String {
        let error = match &self.kind {
            FailureKind::Match(error) => error,
            FailureKind::OverloadExhausted { failures } => {
                let mut out = format!("{}\n", self.kind);
                if let Some(first) = failures.first() {
                    out.push_str("First one:\n");
                    out.push_str(&first.render());
                }
                return out;
            }
        };

        let mut out = self.render_path();
        out.push_str(&format!("Error: {error}\n"));

        if let Some(index) = error.token_index() {
            out.push_str(&format!("on parameter #{index}\n"));
            out.push_str(&format!("=> {}{}{}", self.prefix, self.alias, self.separator));
            let echoed: Vec<String> = self
                .raw_tokens
                .iter()
                .enumerate()
                .map(|(i, raw)| {
                    if i == index {
                        format!("`{raw}`")
                    } else {
                        raw.clone()
                    }
                })
                .collect();
            out.push_str(&echoed.join(&self.separator));
            out.push('\n');
        }

        out.push_str(&error.detail());
        out
    }

    fn render_path(&self) -> String {
        let mut out = String::new();
        for (depth, name) in self.path.iter().enumerate() {
            if depth > 0 {
                out.push_str(&"  ".repeat(depth));
                out.push_str("└─");
            }
            out.push_str(name);
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.path.last() {
            Some(name) => write!(f, "{name}: {}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl std::error::Error for CommandFailure {}

/// Errors in how a command was declared.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("optional parameter #{index} declared before a mandatory one")]
    OptionalBeforeMandatory { index: usize },

    #[error("named parameter #{index} has no flag names")]
    MissingFlagMetadata { index: usize },

    #[error("parameter #{index} of plain type {tag} cannot carry a flag")]
    FlagOnPlainParameter { index: usize, tag: TypeTag },

    #[error("type {tag} has no registered interpreter")]
    UnknownType { tag: TypeTag },

    #[error("no handler registered")]
    MissingHandler,

    #[error("no aliases declared")]
    NoAliases,

    #[error("no configuration entry for command `{0}`")]
    UnknownCommandId(String),

    #[error("invalid command `{command}`")]
    Command {
        command: String,
        #[source]
        source: Box<RegistrationError>,
    },
}

impl RegistrationError {
    pub(crate) fn in_command(self, command: &str) -> Self {
        RegistrationError::Command {
            command: command.to_string(),
            source: Box::new(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueKind;

    fn failure(kind: FailureKind) -> CommandFailure {
        CommandFailure {
            path: vec!["case".to_string(), "upper".to_string()],
            prefix: "!".to_string(),
            alias: "case".to_string(),
            separator: " ".to_string(),
            raw_tokens: vec!["upper".to_string(), "5".to_string(), "x".to_string()],
            kind,
        }
    }

    #[test]
    fn test_render_highlights_offending_token() {
        let rendered = failure(
            MatchError::TypeMismatch {
                index: 1,
                expected: TypeTag::QUOTE,
                found: TypeTag::INTEGER,
            }
            .into(),
        )
        .render();

        assert_eq!(
            rendered,
            "case\n  └─upper\nError: wrong argument type\non parameter #1\n\
             => !case upper `5` x\nTYPE: Integer\nEXPECTED: Quote"
        );
    }

    #[test]
    fn test_render_incomplete_call_lists_expected() {
        let rendered = failure(
            MatchError::IncompleteCall {
                missing: 2,
                expected: vec![TypeTag::INTEGER, TypeTag::named(ValueKind::Text)],
            }
            .into(),
        )
        .render();

        assert!(rendered.contains("missing at least 2 parameter(s)"));
        assert!(rendered.ends_with("=> [Integer, Named<String>]"));
        assert!(!rendered.contains("on parameter"));
    }

    #[test]
    fn test_render_overload_exhausted_shows_first() {
        let first = failure(MatchError::TooManyArguments { index: 2 }.into());
        let second = failure(MatchError::FlagDoesNotExist {
            index: 0,
            name: "x".to_string(),
        }
        .into());
        let rendered = failure(FailureKind::OverloadExhausted {
            failures: vec![first.clone(), second],
        })
        .render();

        assert!(
            rendered.starts_with("error on an overloaded command: 2 total error(s)\nFirst one:\n")
        );
        assert!(rendered.ends_with(&first.render()));
    }

    #[test]
    fn test_token_index() {
        assert_eq!(MatchError::TooManyArguments { index: 3 }.token_index(), Some(3));
        let incomplete = MatchError::IncompleteCall {
            missing: 1,
            expected: vec![TypeTag::INTEGER],
        };
        assert_eq!(incomplete.token_index(), None);
    }

    #[test]
    fn test_registration_error_keeps_source() {
        let error = RegistrationError::NoAliases.in_command("send");
        assert_eq!(error.to_string(), "invalid command `send`");
        let source = std::error::Error::source(&error).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("no aliases declared"));
    }
}
