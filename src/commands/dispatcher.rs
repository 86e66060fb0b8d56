//! Routing messages to commands: subcommand selection, overload fallback,
//! hooks and failure reporting.

use std::collections::BTreeSet;

use super::command::Command;
use super::context::{Invocation, Message, MessageLookup, Transport};
use super::error::{CommandFailure, FailureKind, MatchError, RegistrationError};
use super::signature::{Arguments, extract_global_flags};
use crate::parse::{ArgumentStream, EntityLookup, InterpreterRegistry, Token};
use crate::types::{Capability, GlobalFlag};

/// Where a call came from, as echoed back in failure reports.
#[derive(Debug, Clone, Copy)]
pub struct CallSite<'a> {
    pub prefix: &'a str,
    pub alias: &'a str,
    pub separator: &'a str,
}

/// A successfully resolved call.
#[derive(Debug)]
pub enum Resolution<'c> {
    /// Run `command` with `arguments`.
    Call {
        command: &'c Command,
        path: Vec<String>,
        arguments: Arguments,
    },
    /// Show the help of `command` instead of running it.
    Help { command: &'c Command, path: Vec<String> },
}

/// A failed resolution and the command whose error handler reports it.
#[derive(Debug)]
pub struct Unresolved<'c> {
    pub reporter: &'c Command,
    pub failure: CommandFailure,
}

/// Resolves `tokens` against `command`: descends into a subcommand named by
/// the first token, otherwise matches the command's own signature and then
/// its overloads in declaration order.
pub fn resolve<'c>(
    command: &'c Command,
    tokens: &[Token],
    site: CallSite<'_>,
    permits: &dyn Fn(&Capability) -> bool,
) -> Result<Resolution<'c>, Unresolved<'c>> {
    resolve_inner(command, tokens, Vec::new(), site, permits, true)
}

fn resolve_inner<'c>(
    command: &'c Command,
    tokens: &[Token],
    mut path: Vec<String>,
    site: CallSite<'_>,
    permits: &dyn Fn(&Capability) -> bool,
    with_overloads: bool,
) -> Result<Resolution<'c>, Unresolved<'c>> {
    path.push(command.name.clone());

    if let Some(sub) = tokens.first().and_then(|first| command.subcommand(&first.raw)) {
        tracing::debug!(
            command = %command.name,
            subcommand = %sub.name,
            "descending into subcommand"
        );
        return resolve_inner(sub, &tokens[1..], path, site, permits, true);
    }

    let failure_of = |path: &[String], kind: FailureKind| CommandFailure {
        path: path.to_vec(),
        prefix: site.prefix.to_string(),
        alias: site.alias.to_string(),
        separator: site.separator.to_string(),
        raw_tokens: tokens.iter().map(|t| t.raw.clone()).collect(),
        kind,
    };

    let (globals, _) = extract_global_flags(tokens.iter().enumerate());
    if let Some((_, index)) = globals.iter().find(|(flag, _)| *flag == GlobalFlag::Help) {
        if command.signature.accepts(GlobalFlag::Help) {
            return Ok(Resolution::Help { command, path });
        }
        let error = MatchError::GlobalFlagNotAccepted {
            index: *index,
            flag: GlobalFlag::Help,
        };
        return Err(Unresolved {
            reporter: command,
            failure: failure_of(&path, error.into()),
        });
    }

    let error = match command.signature.match_tokens(tokens, permits) {
        Ok(arguments) => {
            return Ok(Resolution::Call {
                command,
                path,
                arguments,
            });
        }
        Err(error) => error,
    };
    tracing::debug!(command = %command.name, %error, "signature did not match");
    let own = failure_of(&path, error.into());

    if !with_overloads || command.overloads.is_empty() {
        return Err(Unresolved {
            reporter: command,
            failure: own,
        });
    }

    let parent = &path[..path.len() - 1];
    let mut failures = vec![own];
    for overload in &command.overloads {
        match resolve_inner(overload, tokens, parent.to_vec(), site, permits, false) {
            Ok(resolution) => {
                tracing::debug!(
                    command = %command.name,
                    overload = %overload.id,
                    "overload matched"
                );
                return Ok(resolution);
            }
            Err(unresolved) => failures.push(unresolved.failure),
        }
    }

    Err(Unresolved {
        reporter: command,
        failure: failure_of(&path, FailureKind::OverloadExhausted { failures }),
    })
}

/// What handling one command call came to.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The handler ran successfully.
    Dispatched { path: Vec<String>, deleted: bool },
    /// The predicate refused the call.
    Vetoed { path: Vec<String> },
    HelpShown { path: Vec<String> },
    /// No signature matched; the failure was reported.
    Failed(CommandFailure),
    HandlerFailed { path: Vec<String>, error: String },
}

/// Entry point for incoming messages.
///
/// Read-only once commands are registered; share it as `Arc<Router>` across
/// worker tasks.
pub struct Router {
    commands: Vec<Command>,
    registry: InterpreterRegistry,
    separator: String,
}

impl Router {
    pub fn new(registry: InterpreterRegistry) -> Self {
        Self {
            commands: Vec::new(),
            registry,
            separator: " ".to_string(),
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Registers a root command after checking every type it uses can be
    /// interpreted.
    pub fn register(&mut self, command: Command) -> Result<(), RegistrationError> {
        if let Some(tag) = command.tags().into_iter().find(|tag| !self.registry.supports(*tag)) {
            return Err(RegistrationError::UnknownType { tag }.in_command(&command.id));
        }
        if self.commands.iter().any(|c| c.id == command.id) {
            tracing::warn!("Overwriting command: {}", command.id);
            self.commands.retain(|c| c.id != command.id);
        }
        self.commands.push(command);
        Ok(())
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn registry(&self) -> &InterpreterRegistry {
        &self.registry
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Types the argument part of a call for `command`.
    pub fn tokenize(&self, body: &str, lookup: &dyn EntityLookup, command: &Command) -> Vec<Token> {
        let stream = ArgumentStream::split(body, &self.separator, lookup)
            .with_boolean_flags(&command.boolean_flags);
        self.registry.tokenize(&stream)
    }

    /// Dispatches `message` to every root command it calls.
    pub fn handle(&self, message: &Message, transport: &dyn Transport) -> Vec<DispatchOutcome> {
        self.commands
            .iter()
            .filter_map(|command| {
                let alias = command.is_called(message, &self.separator)?;
                Some(self.dispatch(command, alias, message, transport))
            })
            .collect()
    }

    /// Runs one call of `command`, reached through `alias`.
    pub fn dispatch(
        &self,
        command: &Command,
        alias: &str,
        message: &Message,
        transport: &dyn Transport,
    ) -> DispatchOutcome {
        let called = command.prefix.len() + alias.len();
        let rest = message.content.get(called..).unwrap_or_default();
        let body = rest.strip_prefix(self.separator.as_str()).unwrap_or(rest);

        let lookup = MessageLookup { message, transport };
        let tokens = self.tokenize(body, &lookup, command);
        tracing::debug!(
            command = %command.name,
            tokens = ?tokens.iter().map(|t| t.tag.label()).collect::<Vec<_>>(),
            "tokenized call"
        );

        let permits = |capability: &Capability| {
            !message.is_from_guild() || transport.has_capability(message, capability)
        };
        let site = CallSite {
            prefix: &command.prefix,
            alias,
            separator: &self.separator,
        };

        match resolve(command, &tokens, site, &permits) {
            Ok(Resolution::Call {
                command: target,
                path,
                arguments,
            }) => {
                let invocation = Invocation {
                    message,
                    transport,
                    prefix: &command.prefix,
                    alias,
                    path: path.clone(),
                    global_flags: arguments.global_flags.clone(),
                };
                run(target, &invocation, &arguments)
            }
            Ok(Resolution::Help { command: target, path }) => {
                if let Err(e) = transport.show_help(message, &target.help_page(path.clone())) {
                    tracing::warn!(command = %target.name, error = %e, "failed to show help");
                }
                DispatchOutcome::HelpShown { path }
            }
            Err(Unresolved { reporter, failure }) => {
                tracing::debug!(command = %reporter.name, %failure, "dispatch failed");
                let reported = match &reporter.on_error {
                    Some(on_error) => {
                        let invocation = Invocation {
                            message,
                            transport,
                            prefix: &command.prefix,
                            alias,
                            path: failure.path.clone(),
                            global_flags: BTreeSet::new(),
                        };
                        on_error(&invocation, &failure)
                    }
                    None => transport.report_failure(message, &failure),
                };
                if let Err(e) = reported {
                    tracing::warn!(
                        command = %reporter.name,
                        error = %e,
                        "failed to report failure"
                    );
                }
                DispatchOutcome::Failed(failure)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(InterpreterRegistry::default())
    }
}

fn run(command: &Command, invocation: &Invocation<'_>, arguments: &Arguments) -> DispatchOutcome {
    let path = invocation.path.clone();

    if let Some(predicate) = &command.predicate {
        if !predicate(invocation, arguments) {
            tracing::debug!(command = %command.name, "predicate vetoed call");
            return DispatchOutcome::Vetoed { path };
        }
    }

    if let Err(e) = (command.handler)(invocation, arguments) {
        tracing::error!(command = %command.name, error = %e, "command handler failed");
        return DispatchOutcome::HandlerFailed {
            path,
            error: e.to_string(),
        };
    }

    let mut deleted = false;
    if invocation.has_flag(GlobalFlag::AutoDelete) {
        match invocation.transport.delete_message(invocation.message) {
            Ok(()) => deleted = true,
            Err(e) => {
                tracing::warn!(command = %command.name, error = %e, "failed to delete message")
            }
        }
    }

    DispatchOutcome::Dispatched { path, deleted }
}
