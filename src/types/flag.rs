use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Cross-cutting switches recognized on every command, independent of its
/// signature. A command lists the ones it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GlobalFlag {
    /// Delete the triggering message once the command ran.
    #[serde(rename = "autodelete")]
    AutoDelete,
    /// Show the command help instead of running it.
    #[serde(rename = "help")]
    Help,
}

impl GlobalFlag {
    pub fn name(&self) -> &'static str {
        match self {
            GlobalFlag::AutoDelete => "autodelete",
            GlobalFlag::Help => "help",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            GlobalFlag::AutoDelete => "delete the command message after it ran",
            GlobalFlag::Help => "show the help of the command",
        }
    }

    pub fn all() -> [GlobalFlag; 2] {
        [GlobalFlag::AutoDelete, GlobalFlag::Help]
    }

    pub fn from_name(name: &str) -> Option<GlobalFlag> {
        GlobalFlag::all().into_iter().find(|flag| flag.name() == name)
    }
}

impl fmt::Display for GlobalFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A permission the caller must hold to use a named flag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    /// Held by anyone allowed to post in the channel; the default requirement.
    pub const SEND_MESSAGES: Capability = Capability(Cow::Borrowed("send_messages"));
    pub const MANAGE_MESSAGES: Capability = Capability(Cow::Borrowed("manage_messages"));
    pub const ADMINISTRATOR: Capability = Capability(Cow::Borrowed("administrator"));

    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Capability {
    fn default() -> Self {
        Capability::SEND_MESSAGES
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flag_names_round_trip() {
        for flag in GlobalFlag::all() {
            assert_eq!(GlobalFlag::from_name(flag.name()), Some(flag));
        }
        assert_eq!(GlobalFlag::from_name("auto-delete"), None);
    }

    #[test]
    fn test_capability_equality_ignores_storage() {
        assert_eq!(Capability::new("send_messages"), Capability::SEND_MESSAGES);
        assert_eq!(Capability::default().as_str(), "send_messages");
    }
}
