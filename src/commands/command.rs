//! Command declarations and the builder registering them.

use std::fmt;
use std::sync::Arc;

use super::context::{FlagHelp, HelpPage, Invocation, Message};
use super::error::{CommandFailure, RegistrationError};
use super::signature::{Arguments, CommandSignature, FlagSpec, Parameter};
use crate::config::CommandMeta;
use crate::types::{GlobalFlag, TypeTag};

/// Body of a command, run once its arguments matched.
pub type Handler = Arc<dyn Fn(&Invocation<'_>, &Arguments) -> anyhow::Result<()> + Send + Sync>;

/// Check run before the handler. Returning `false` silently aborts the call.
pub type Predicate = Arc<dyn Fn(&Invocation<'_>, &Arguments) -> bool + Send + Sync>;

/// Replaces the transport's failure report for one command.
pub type ErrorHandler =
    Arc<dyn Fn(&Invocation<'_>, &CommandFailure) -> anyhow::Result<()> + Send + Sync>;

/// A registered command with its subcommands and overloads.
#[derive(Clone)]
pub struct Command {
    pub id: String,
    pub name: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub prefix: String,
    pub example: Option<String>,
    pub see: Vec<String>,
    /// Whether messages from bot authors may call it.
    pub bot_runnable: bool,
    pub signature: CommandSignature,
    pub(crate) handler: Handler,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) on_error: Option<ErrorHandler>,
    pub subcommands: Vec<Command>,
    pub overloads: Vec<Command>,
    /// Named-boolean flag names across this command, its subcommands and
    /// overloads. Used while tokenizing so switches do not swallow values.
    pub boolean_flags: Vec<String>,
}

impl Command {
    pub fn builder(id: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(id)
    }

    /// The alias `message` calls this command with, if any.
    ///
    /// The content must start with the prefix and an alias, followed by the
    /// separator or nothing. Bot authors are ignored unless the command is
    /// bot-runnable.
    pub fn is_called(&self, message: &Message, separator: &str) -> Option<&str> {
        if message.author.is_bot && !self.bot_runnable {
            return None;
        }
        let rest = message.content.strip_prefix(self.prefix.as_str())?;
        self.aliases
            .iter()
            .find(|alias| {
                rest.strip_prefix(alias.as_str()).is_some_and(|tail| {
                    tail.is_empty() || (!separator.is_empty() && tail.starts_with(separator))
                })
            })
            .map(String::as_str)
    }

    /// The direct subcommand one of whose aliases is `raw`.
    pub fn subcommand(&self, raw: &str) -> Option<&Command> {
        self.subcommands
            .iter()
            .find(|sub| sub.aliases.iter().any(|alias| alias == raw))
    }

    /// Every tag used by this command tree.
    pub fn tags(&self) -> Vec<TypeTag> {
        let mut tags: Vec<TypeTag> = self.signature.slots().iter().map(|slot| slot.tag).collect();
        for child in self.subcommands.iter().chain(&self.overloads) {
            tags.extend(child.tags());
        }
        tags
    }

    pub fn help_page(&self, path: Vec<String>) -> HelpPage {
        let usage = self
            .signature
            .slots()
            .iter()
            .filter(|slot| !slot.tag.is_named())
            .map(|slot| {
                if slot.mandatory {
                    format!("<{}>", slot.tag)
                } else {
                    format!("[{}]", slot.tag)
                }
            })
            .collect();
        let flags = self
            .signature
            .flags()
            .map(|(flag, slot)| FlagHelp {
                names: flag.names.clone(),
                kind: self.signature.slots()[slot].tag.kind().label().to_string(),
                help: flag.help.clone(),
            })
            .collect();

        HelpPage {
            path,
            prefix: self.prefix.clone(),
            aliases: self.aliases.clone(),
            help: self.help.clone(),
            example: self.example.clone(),
            see: self.see.clone(),
            usage,
            flags,
            global_flags: self.signature.global_flags().iter().copied().collect(),
            subcommands: self
                .subcommands
                .iter()
                .map(|sub| (sub.name.clone(), sub.help.clone()))
                .collect(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("signature", &self.signature)
            .field("subcommands", &self.subcommands)
            .field("overloads", &self.overloads)
            .finish_non_exhaustive()
    }
}

/// Collects a command's metadata, parameters and hooks.
pub struct CommandBuilder {
    id: String,
    name: Option<String>,
    aliases: Vec<String>,
    help: String,
    prefix: String,
    example: Option<String>,
    see: Vec<String>,
    bot_runnable: bool,
    parameters: Vec<Parameter>,
    global_flags: Vec<GlobalFlag>,
    flag_help: Vec<(String, String)>,
    handler: Option<Handler>,
    predicate: Option<Predicate>,
    on_error: Option<ErrorHandler>,
    subcommands: Vec<Command>,
    overloads: Vec<Command>,
}

impl CommandBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            aliases: Vec::new(),
            help: String::new(),
            prefix: "!".to_string(),
            example: None,
            see: Vec::new(),
            bot_runnable: false,
            parameters: Vec::new(),
            global_flags: vec![GlobalFlag::AutoDelete],
            flag_help: Vec::new(),
            handler: None,
            predicate: None,
            on_error: None,
            subcommands: Vec::new(),
            overloads: Vec::new(),
        }
    }

    /// Display name; defaults to the id.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases = aliases.into_iter().map(Into::into).collect();
        self
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn see<I, S>(mut self, see: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.see = see.into_iter().map(Into::into).collect();
        self
    }

    pub fn bot_runnable(mut self, bot_runnable: bool) -> Self {
        self.bot_runnable = bot_runnable;
        self
    }

    pub fn mandatory(mut self, tag: TypeTag) -> Self {
        self.parameters.push(Parameter::mandatory(tag));
        self
    }

    pub fn optional(mut self, tag: TypeTag) -> Self {
        self.parameters.push(Parameter::optional(tag));
        self
    }

    pub fn named(mut self, tag: TypeTag, flag: FlagSpec) -> Self {
        self.parameters.push(Parameter::named(tag, flag));
        self
    }

    /// Global flags the command accepts, replacing the default `autodelete`.
    pub fn global_flags(mut self, flags: impl IntoIterator<Item = GlobalFlag>) -> Self {
        self.global_flags = flags.into_iter().collect();
        self
    }

    pub fn handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Invocation<'_>, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handler = Some(Arc::new(handler));
        self
    }

    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Invocation<'_>, &Arguments) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&Invocation<'_>, &CommandFailure) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    /// A sibling signature tried, in declaration order, when this one fails.
    pub fn overload(mut self, command: Command) -> Self {
        self.overloads.push(command);
        self
    }

    /// Applies configured metadata over what was declared in code.
    pub fn metadata(mut self, meta: &CommandMeta) -> Self {
        if let Some(name) = &meta.name {
            self.name = Some(name.clone());
        }
        if !meta.aliases.is_empty() {
            self.aliases = meta.aliases.clone();
        }
        if let Some(help) = &meta.help {
            self.help = help.clone();
        }
        if let Some(prefix) = &meta.prefix {
            self.prefix = prefix.clone();
        }
        if let Some(example) = &meta.example {
            self.example = Some(example.clone());
        }
        if !meta.see.is_empty() {
            self.see = meta.see.clone();
        }
        if let Some(bot_runnable) = meta.bot_runnable {
            self.bot_runnable = bot_runnable;
        }
        if let Some(flags) = &meta.usable_global_flags {
            self.global_flags = flags.clone();
        }
        self.flag_help
            .extend(meta.flags.iter().map(|(name, help)| (name.clone(), help.clone())));
        self
    }

    pub fn build(self) -> Result<Command, RegistrationError> {
        let id = self.id;
        if self.aliases.is_empty() {
            return Err(RegistrationError::NoAliases.in_command(&id));
        }
        let handler = self
            .handler
            .ok_or_else(|| RegistrationError::MissingHandler.in_command(&id))?;

        let parameters = self
            .parameters
            .into_iter()
            .map(|mut parameter| {
                if let Some(flag) = parameter.flag.as_mut().filter(|flag| flag.help.is_empty()) {
                    let configured = self.flag_help.iter().find(|(name, _)| flag.matches(name));
                    if let Some((_, help)) = configured {
                        flag.help = help.clone();
                    }
                }
                parameter
            })
            .collect();
        let signature = CommandSignature::new(parameters, self.global_flags)
            .map_err(|e| e.in_command(&id))?;

        let mut boolean_flags: Vec<String> =
            signature.boolean_flag_names().map(str::to_string).collect();
        for child in self.subcommands.iter().chain(&self.overloads) {
            for name in &child.boolean_flags {
                if !boolean_flags.contains(name) {
                    boolean_flags.push(name.clone());
                }
            }
        }

        Ok(Command {
            name: self.name.unwrap_or_else(|| id.clone()),
            id,
            aliases: self.aliases,
            help: self.help,
            prefix: self.prefix,
            example: self.example,
            see: self.see,
            bot_runnable: self.bot_runnable,
            signature,
            handler,
            predicate: self.predicate,
            on_error: self.on_error,
            subcommands: self.subcommands,
            overloads: self.overloads,
            boolean_flags,
        })
    }
}
