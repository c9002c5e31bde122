//! Shell commands and the registry that maps names to them.

use anyhow::Result;
use pwdmgr_core::{AccountStore, Settings};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::console::Console;

mod accounts;
mod general;

pub(crate) use accounts::print_account;
pub use accounts::{AddCommand, DeleteCommand, ListCommand, ModifyCommand, ViewCommand};
pub use general::{ConfigCommand, ExitCommand, HelpCommand, InfoCommand, PwgenCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug, thiserror::Error)]
#[error("wrong number of arguments")]
pub struct UsageError;

/// Positional arguments after the command name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Everything a command may touch while it runs.
pub struct Context<'a> {
    pub store: &'a mut AccountStore,
    pub settings: &'a mut Settings,
    pub settings_path: &'a Path,
    pub console: &'a mut Console,
    pub registry: &'a Registry,
}

pub trait Command {
    fn name(&self) -> &'static str;

    /// Argument synopsis shown by `help`.
    fn usage(&self) -> &'static str {
        ""
    }

    fn describe(&self) -> &'static str;

    /// Accepted number of positional arguments.
    fn arity(&self) -> RangeInclusive<usize> {
        0..=0
    }

    fn parse_args(&self, raw: &[&str]) -> Result<Args> {
        if !self.arity().contains(&raw.len()) {
            return Err(UsageError.into());
        }
        Ok(Args(raw.iter().map(|s| s.to_string()).collect()))
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow>;
}

#[derive(Default)]
pub struct Registry {
    commands: BTreeMap<&'static str, Box<dyn Command>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in commands.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(AddCommand);
        registry.register(ListCommand);
        registry.register(ViewCommand);
        registry.register(ModifyCommand);
        registry.register(DeleteCommand);
        registry.register(InfoCommand);
        registry.register(ConfigCommand);
        registry.register(PwgenCommand);
        registry.register(HelpCommand);
        registry.register(ExitCommand);
        registry
    }

    pub fn register(&mut self, command: impl Command + 'static) {
        self.commands.insert(command.name(), Box::new(command));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(|c| c.as_ref())
    }

    /// Commands in name order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.values().map(|c| c.as_ref())
    }
}
