//! Console front-end: reads chat lines from stdin and answers on stdout.

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::{Author, CommandFailure, Message, Router, Transport};
use crate::config::FlowerConfig;
use crate::demo;
use crate::parse::InterpreterRegistry;
use crate::types::Capability;

/// Typing this line ends the session.
pub const STOP: &str = "stop";

#[derive(Parser, Debug)]
#[command(
    name = "flower",
    about = "Flower: typed chat commands, served on the console",
    version
)]
pub struct Cli {
    /// TOML file with the prefix, separator and command metadata
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Command prefix, overriding the config file
    #[arg(long)]
    pub prefix: Option<String>,

    /// Token separator, overriding the config file
    #[arg(long)]
    pub separator: Option<String>,

    /// Capability granted to the console user (repeatable)
    #[arg(long = "capability", value_name = "NAME")]
    pub capabilities: Vec<String>,

    /// Post messages as a bot author
    #[arg(long)]
    pub bot: bool,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// The configuration file, if any, with command-line overrides applied.
    pub fn load_config(&self) -> anyhow::Result<FlowerConfig> {
        let mut config = match &self.config {
            Some(path) => FlowerConfig::load(path)?,
            None => FlowerConfig::default(),
        };
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
        if let Some(separator) = &self.separator {
            config.separator = separator.clone();
        }
        Ok(config)
    }
}

/// Transport writing replies to a console. Every message is posted in guild 1
/// so capability checks apply.
pub struct ConsoleTransport<W> {
    capabilities: Vec<Capability>,
    out: Mutex<W>,
}

pub const CONSOLE_GUILD: u64 = 1;

impl<W: Write + Send> ConsoleTransport<W> {
    pub fn new(capabilities: Vec<Capability>, out: W) -> Self {
        Self {
            capabilities,
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_line(&self, line: &str) -> anyhow::Result<()> {
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("console output lock poisoned"))?;
        writeln!(out, "{line}")?;
        Ok(())
    }
}

impl<W: Write + Send> Transport for ConsoleTransport<W> {
    /// The console user may always post, so `send_messages` is implied.
    fn has_capability(&self, _message: &Message, capability: &Capability) -> bool {
        *capability == Capability::SEND_MESSAGES
            || self.capabilities.contains(&Capability::ADMINISTRATOR)
            || self.capabilities.contains(capability)
    }

    fn reply(&self, _message: &Message, content: &str) -> anyhow::Result<()> {
        self.write_line(content)
    }

    fn delete_message(&self, message: &Message) -> anyhow::Result<()> {
        self.write_line(&format!("(message #{} deleted)", message.id))
    }

    fn report_failure(&self, _message: &Message, failure: &CommandFailure) -> anyhow::Result<()> {
        self.write_line(&failure.render())
    }
}

/// Serves `input` line by line until it ends or [`STOP`] is read.
pub fn serve<R, W>(
    router: &Router,
    transport: &ConsoleTransport<W>,
    input: R,
    bot: bool,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write + Send,
{
    let author = Author { id: 1, is_bot: bot };
    for (id, line) in (1u64..).zip(input.lines()) {
        let line = line.context("failed to read input")?;
        if line.trim().eq_ignore_ascii_case(STOP) {
            break;
        }
        let message = Message::new(id, line, author).in_guild(CONSOLE_GUILD);
        let outcomes = router.handle(&message, transport);
        tracing::debug!(message = id, ?outcomes, "handled message");
    }
    Ok(())
}

/// Installs the fmt subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {e}");
    }
}

/// Parses the command line (or `args`), installs logging and serves stdin.
pub fn parse(args: Option<&[&str]>) -> anyhow::Result<()> {
    let cli = match args {
        Some(args) => Cli::try_parse_from(args)?,
        None => Cli::parse(),
    };
    init_tracing(cli.verbose);
    run(&cli)
}

/// Serves stdin with the demo commands, configured by `cli`.
pub fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = cli.load_config()?;

    let mut router =
        Router::new(InterpreterRegistry::default()).with_separator(config.separator.clone());
    demo::register_all(&mut router, &config)?;

    let capabilities = cli.capabilities.iter().map(|c| Capability::new(c.as_str())).collect();
    let transport = ConsoleTransport::new(capabilities, std::io::stdout());

    println!("Type \"{STOP}\" to stop.");
    serve(&router, &transport, std::io::stdin().lock(), cli.bot)?;
    println!("Shutting down.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn console(capabilities: Vec<Capability>, input: &str) -> String {
        let config = FlowerConfig::default();
        let mut router = Router::default();
        demo::register_all(&mut router, &config).unwrap();
        let transport = ConsoleTransport::new(capabilities, Vec::new());
        serve(&router, &transport, input.as_bytes(), false).unwrap();
        String::from_utf8(transport.into_inner()).unwrap()
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;

        Cli::command().debug_assert()
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from([
            "flower",
            "--prefix",
            "?",
            "--capability",
            "manage_messages",
            "--capability",
            "administrator",
            "--bot",
        ])
        .unwrap();
        assert_eq!(cli.prefix.as_deref(), Some("?"));
        assert_eq!(cli.capabilities, vec!["manage_messages", "administrator"]);
        assert!(cli.bot);

        let config = cli.load_config().unwrap();
        assert_eq!(config.prefix, "?");
        assert_eq!(config.separator, " ");
    }

    #[test]
    fn test_serve_answers_until_stop() {
        let out = console(vec![], "!sum 1 2\n!sum 1.5 1.0\nstop\n!sum 3 4\n");
        assert_eq!(out, "3\n2.5\n");
    }

    #[test]
    fn test_ordinary_flags_need_no_granted_capability() {
        let out = console(vec![], "!shout `hi` --repeat 2\n!shout `hi` --loud\n");
        assert_eq!(out, "hi hi\nHI\n");
    }

    #[test]
    fn test_serve_reports_failures() {
        let out = console(vec![], "!send `hi` --pipe <#5>\n");
        assert!(out.contains("Error: missing permission `manage_messages`"));

        let out = console(
            vec![Capability::MANAGE_MESSAGES],
            "!send `hi` --pipe <#5> --autodelete\n",
        );
        assert_eq!(out, "[<#5>] hi\n(message #1 deleted)\n");
    }
}
