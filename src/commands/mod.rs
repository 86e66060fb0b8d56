//! Commands: declaration, signature matching and dispatch.

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod signature;

pub use command::{Command, CommandBuilder, ErrorHandler, Handler, Predicate};
pub use context::{Author, FlagHelp, HelpPage, Invocation, Message, Transport};
pub use dispatcher::{CallSite, DispatchOutcome, Resolution, Router, Unresolved, resolve};
pub use error::{CommandFailure, FailureKind, MatchError, RegistrationError};
pub use signature::{
    Arguments, CommandSignature, FlagSpec, MatchResult, Parameter, ParameterSlot,
    extract_global_flags,
};
