//! What a command sees of the chat platform: the triggering message and the
//! transport used to answer it.

use std::collections::BTreeSet;

use super::error::CommandFailure;
use crate::parse::EntityLookup;
use crate::types::{Capability, ChannelId, GlobalFlag, MemberId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Author {
    pub id: u64,
    pub is_bot: bool,
}

/// One incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u64,
    pub content: String,
    pub author: Author,
    /// Guild the message was posted in; `None` for direct messages.
    pub guild: Option<u64>,
}

impl Message {
    pub fn new(id: u64, content: impl Into<String>, author: Author) -> Self {
        Self {
            id,
            content: content.into(),
            author,
            guild: None,
        }
    }

    pub fn in_guild(mut self, guild: u64) -> Self {
        self.guild = Some(guild);
        self
    }

    pub fn is_from_guild(&self) -> bool {
        self.guild.is_some()
    }
}

/// The chat platform a router answers on.
///
/// Implementations are shared between worker tasks.
pub trait Transport: Send + Sync {
    fn has_capability(&self, message: &Message, capability: &Capability) -> bool;

    fn member_exists(&self, _guild: u64, _member: MemberId) -> bool {
        true
    }

    fn channel_exists(&self, _channel: ChannelId) -> bool {
        true
    }

    fn reply(&self, message: &Message, content: &str) -> anyhow::Result<()>;

    fn delete_message(&self, message: &Message) -> anyhow::Result<()>;

    /// Reports a failed dispatch for commands without their own error handler.
    fn report_failure(&self, message: &Message, failure: &CommandFailure) -> anyhow::Result<()> {
        self.reply(message, &failure.render())
    }

    fn show_help(&self, message: &Message, help: &HelpPage) -> anyhow::Result<()> {
        self.reply(message, &help.render())
    }
}

/// Resolves mentions of a message through its transport. Members only exist
/// inside a guild.
pub(crate) struct MessageLookup<'a> {
    pub message: &'a Message,
    pub transport: &'a dyn Transport,
}

impl EntityLookup for MessageLookup<'_> {
    fn member_exists(&self, member: MemberId) -> bool {
        self.message
            .guild
            .is_some_and(|guild| self.transport.member_exists(guild, member))
    }

    fn channel_exists(&self, channel: ChannelId) -> bool {
        self.transport.channel_exists(channel)
    }
}

/// The call a handler runs for.
pub struct Invocation<'a> {
    pub message: &'a Message,
    pub transport: &'a dyn Transport,
    pub prefix: &'a str,
    pub alias: &'a str,
    /// Names from the root command down to the invoked one.
    pub path: Vec<String>,
    pub global_flags: BTreeSet<GlobalFlag>,
}

impl Invocation<'_> {
    pub fn reply(&self, content: &str) -> anyhow::Result<()> {
        self.transport.reply(self.message, content)
    }

    pub fn has_flag(&self, flag: GlobalFlag) -> bool {
        self.global_flags.contains(&flag)
    }
}

/// A named parameter as listed in help.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagHelp {
    pub names: Vec<String>,
    pub kind: String,
    pub help: String,
}

/// Everything needed to describe a command to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelpPage {
    pub path: Vec<String>,
    pub prefix: String,
    pub aliases: Vec<String>,
    pub help: String,
    pub example: Option<String>,
    pub see: Vec<String>,
    /// Labels of the positional parameters, optional ones in brackets.
    pub usage: Vec<String>,
    pub flags: Vec<FlagHelp>,
    pub global_flags: Vec<GlobalFlag>,
    pub subcommands: Vec<(String, String)>,
}

impl HelpPage {
    pub fn render(&self) -> String {
        let mut out = self.path.join(" ");
        out.push('\n');
        if !self.help.is_empty() {
            out.push_str(&self.help);
            out.push('\n');
        }

        let alias = self.aliases.first().map(String::as_str).unwrap_or_default();
        out.push_str(&format!("usage: {}{}", self.prefix, alias));
        for parameter in &self.usage {
            out.push(' ');
            out.push_str(parameter);
        }
        out.push('\n');

        if self.aliases.len() > 1 {
            out.push_str(&format!("aliases: {}\n", self.aliases.join(", ")));
        }
        for flag in &self.flags {
            let names: Vec<String> = flag.names.iter().map(|n| format!("--{n}")).collect();
            out.push_str(&format!("  {} <{}>  {}\n", names.join(", "), flag.kind, flag.help));
        }
        for flag in &self.global_flags {
            out.push_str(&format!("  --{flag}  {}\n", flag.description()));
        }
        if !self.subcommands.is_empty() {
            out.push_str("subcommands:\n");
            for (name, help) in &self.subcommands {
                out.push_str(&format!("  {name}  {help}\n"));
            }
        }
        if let Some(example) = &self.example {
            out.push_str(&format!("example: {example}\n"));
        }
        if !self.see.is_empty() {
            out.push_str(&format!("see also: {}\n", self.see.join(", ")));
        }
        out
    }
}
