//! Commands served by the console binary.

use crate::commands::{Command, CommandBuilder, FlagSpec, RegistrationError, Router};
use crate::config::FlowerConfig;
use crate::types::{Capability, GlobalFlag, TypeTag, ValueKind};

pub const SEND_ID: &str = "send";
pub const SUM_ID: &str = "sum";
pub const CASE_ID: &str = "case";
pub const SHOUT_ID: &str = "shout";

/// Longest quote `shout` agrees to repeat.
pub const SHOUT_MAX_LEN: usize = 50;

/// Applies the router prefix and the configured metadata of `id`, then builds.
///
/// A config without a `commands` table leaves every command as declared; once
/// the table exists, each command must have an entry.
fn finish(
    builder: CommandBuilder,
    id: &str,
    config: &FlowerConfig,
) -> Result<Command, RegistrationError> {
    let builder = builder.prefix(config.prefix.clone());
    if config.commands.is_empty() {
        return builder.build();
    }
    let meta = config
        .command(id)
        .ok_or_else(|| RegistrationError::UnknownCommandId(id.to_string()))?;
    builder.metadata(meta).build()
}

/// `send <quote> [--pipe <#channel>]`
pub fn send(config: &FlowerConfig) -> Result<Command, RegistrationError> {
    let builder = Command::builder(SEND_ID)
        .aliases([SEND_ID])
        .help("Send a quote, to another channel with --pipe")
        .example("!send `hello there` --pipe <#42>")
        .mandatory(TypeTag::QUOTE)
        .named(
            TypeTag::named(ValueKind::Channel),
            FlagSpec::new(["pipe", "p"]).capability(Capability::MANAGE_MESSAGES),
        )
        .global_flags(GlobalFlag::all())
        .handler(|invocation, args| {
            let Some(quote) = args.quote(0) else {
                return Ok(());
            };
            match args.channel(1) {
                Some(channel) => invocation.reply(&format!("[{channel}] {quote}")),
                None => invocation.reply(&quote.message),
            }
        });
    finish(builder, SEND_ID, config)
}

/// `sum <int> <int>`, falling back to `sum <real> <real>`.
pub fn sum(config: &FlowerConfig) -> Result<Command, RegistrationError> {
    let reals = Command::builder("sum-real")
        .name(SUM_ID)
        .aliases([SUM_ID])
        .mandatory(TypeTag::REAL)
        .mandatory(TypeTag::REAL)
        .handler(|invocation, args| {
            let total = args.real(0).unwrap_or_default() + args.real(1).unwrap_or_default();
            invocation.reply(&total.to_string())
        })
        .build()?;

    let builder = Command::builder(SUM_ID)
        .aliases([SUM_ID, "add"])
        .help("Add two numbers")
        .mandatory(TypeTag::INTEGER)
        .mandatory(TypeTag::INTEGER)
        .overload(reals)
        .handler(|invocation, args| {
            let a = args.integer(0).unwrap_or_default();
            let b = args.integer(1).unwrap_or_default();
            let total = a
                .checked_add(b)
                .ok_or_else(|| anyhow::anyhow!("{a} + {b} overflows"))?;
            invocation.reply(&total.to_string())
        });
    finish(builder, SUM_ID, config)
}

/// `case upper <quote>` / `case lower <quote>`.
pub fn case(config: &FlowerConfig) -> Result<Command, RegistrationError> {
    let upper = Command::builder("upper")
        .aliases(["upper", "up"])
        .help("Upper-case a quote")
        .mandatory(TypeTag::QUOTE)
        .handler(|invocation, args| match args.quote(0) {
            Some(quote) => invocation.reply(&quote.message.to_uppercase()),
            None => Ok(()),
        })
        .build()?;
    let lower = Command::builder("lower")
        .aliases(["lower", "low"])
        .help("Lower-case a quote")
        .mandatory(TypeTag::QUOTE)
        .handler(|invocation, args| match args.quote(0) {
            Some(quote) => invocation.reply(&quote.message.to_lowercase()),
            None => Ok(()),
        })
        .build()?;

    let builder = Command::builder(CASE_ID)
        .aliases([CASE_ID])
        .help("Change the case of a quote")
        .global_flags(GlobalFlag::all())
        .subcommand(upper)
        .subcommand(lower)
        .handler(|invocation, _| invocation.reply("usage: case upper|lower <quote>"));
    finish(builder, CASE_ID, config)
}

/// `shout <quote> [--repeat <n>] [--loud]`, refusing quotes longer than
/// [`SHOUT_MAX_LEN`].
pub fn shout(config: &FlowerConfig) -> Result<Command, RegistrationError> {
    let builder = Command::builder(SHOUT_ID)
        .aliases([SHOUT_ID, "yell"])
        .help("Repeat a quote")
        .mandatory(TypeTag::QUOTE)
        .named(
            TypeTag::named(ValueKind::Integer),
            FlagSpec::new(["repeat", "r"]).help("times to repeat the quote"),
        )
        .named(
            TypeTag::named(ValueKind::Boolean),
            FlagSpec::new(["loud"]).help("upper-case the quote"),
        )
        .global_flags(GlobalFlag::all())
        .predicate(|_, args| {
            args.quote(0)
                .is_some_and(|quote| (1..=SHOUT_MAX_LEN).contains(&quote.message.chars().count()))
        })
        .handler(|invocation, args| {
            let Some(quote) = args.quote(0) else {
                return Ok(());
            };
            let repeat = args.integer(1).unwrap_or(1).clamp(1, 5) as usize;
            let text = if args.boolean(2).unwrap_or(false) {
                quote.message.to_uppercase()
            } else {
                quote.message.clone()
            };
            invocation.reply(&vec![text; repeat].join(" "))
        });
    finish(builder, SHOUT_ID, config)
}

/// Registers every demo command on `router`.
pub fn register_all(router: &mut Router, config: &FlowerConfig) -> Result<(), RegistrationError> {
    for command in [send(config)?, sum(config)?, case(config)?, shout(config)?] {
        tracing::debug!(command = %command.id, aliases = ?command.aliases, "registering command");
        router.register(command)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_all_without_metadata() {
        let mut router = Router::default();
        register_all(&mut router, &FlowerConfig::default()).unwrap();
        let ids: Vec<&str> = router.commands().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![SEND_ID, SUM_ID, CASE_ID, SHOUT_ID]);
    }

    #[test]
    fn test_metadata_is_applied() {
        let config = FlowerConfig::from_toml_str(
            r#"
prefix = "?"

[commands.send]
aliases = ["post"]

[commands.sum]
[commands.case]
[commands.shout]
help = "Yell a quote"
"#,
        )
        .unwrap();
        let mut router = Router::default();
        register_all(&mut router, &config).unwrap();

        let send = &router.commands()[0];
        assert_eq!(send.prefix, "?");
        assert_eq!(send.aliases, vec!["post"]);
        assert_eq!(router.commands()[3].help, "Yell a quote");
    }

    #[test]
    fn test_missing_command_entry_is_rejected() {
        let config = FlowerConfig::from_toml_str("[commands.send]\n").unwrap();
        let mut router = Router::default();
        let error = register_all(&mut router, &config).unwrap_err();
        assert!(matches!(error, RegistrationError::UnknownCommandId(ref id) if id == SUM_ID));
    }
}
