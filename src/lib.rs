//! Typed chat-command parsing and dispatch.
//!
//! A message such as `!send "hello there" --pipe <#42>` is split into raw
//! tokens, each token is typed by an ordered list of interpreters, and the
//! typed tokens are matched against the signature of the called command, its
//! subcommands and its overloads before the handler runs.

pub mod cli;
pub mod commands;
pub mod config;
pub mod demo;
pub mod parse;
pub mod types;
