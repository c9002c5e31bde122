use anyhow::{anyhow, Context as _, Result};
use pwdmgr_core::generator::generate_password;
use pwdmgr_core::QueryEngine;
use std::fs;
use std::io::Write;
use std::ops::RangeInclusive;

use super::{Args, Command, Context, Flow};

pub struct InfoCommand;

impl Command for InfoCommand {
    fn name(&self) -> &'static str {
        "info"
    }

    fn describe(&self) -> &'static str {
        "Information about the vault and configuration."
    }

    fn execute(&self, _args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let engine = QueryEngine::open(ctx.store)?;
        let store = engine.store();
        let size = fs::metadata(store.path()).map(|m| m.len()).unwrap_or(0);
        let backups = store.rotator().existing(store.path()).len();

        let out = ctx.console.out();
        writeln!(out, "{:<25}: {}", "Vault file", store.path().display())?;
        writeln!(out, "{:<25}: {}", "Vault file size", human_size(size))?;
        writeln!(out, "{:<25}: {}", "Total accounts", engine.len())?;
        writeln!(
            out,
            "{:<25}: {}",
            "Last updated",
            engine.last_updated().unwrap_or("-")
        )?;
        writeln!(out, "{:<25}: {}", "Backups", backups)?;
        writeln!(out, "Configuration:")?;
        for (key, value) in ctx.settings.entries() {
            writeln!(out, "  {key:<27}: {value}")?;
        }
        Ok(Flow::Continue)
    }
}

pub struct ConfigCommand;

impl Command for ConfigCommand {
    fn name(&self) -> &'static str {
        "config"
    }

    fn usage(&self) -> &'static str {
        "[<key>=<value>]"
    }

    fn describe(&self) -> &'static str {
        "List configuration or set a configuration value."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        if let Some(assignment) = args.get(0) {
            let (key, value) = assignment
                .split_once('=')
                .ok_or_else(|| anyhow!("{assignment} not recognized, expected <key>=<value>"))?;
            ctx.settings.set(key, value)?;
            ctx.settings.save(ctx.settings_path)?;
            ctx.store
                .set_max_backups(ctx.settings.max_password_file_backups);
        }
        for (key, value) in ctx.settings.entries() {
            writeln!(ctx.console.out(), "{key:<27}: {value}")?;
        }
        Ok(Flow::Continue)
    }
}

pub struct PwgenCommand;

impl Command for PwgenCommand {
    fn name(&self) -> &'static str {
        "pwgen"
    }

    fn usage(&self) -> &'static str {
        "[<length>]"
    }

    fn describe(&self) -> &'static str {
        "Generate a random password."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let length = match args.get(0) {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid password length {raw:?}"))?,
            None => ctx.settings.pwgen_length,
        };
        writeln!(ctx.console.out(), "{}", generate_password(length)?)?;
        Ok(Flow::Continue)
    }
}

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name(&self) -> &'static str {
        "help"
    }

    fn describe(&self) -> &'static str {
        "This help."
    }

    fn execute(&self, _args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let out = ctx.console.out();
        writeln!(out, "Commands:")?;
        for command in ctx.registry.iter() {
            writeln!(
                out,
                "  {:<8} {:<18} {}",
                command.name(),
                command.usage(),
                command.describe()
            )?;
        }
        Ok(Flow::Continue)
    }
}

pub struct ExitCommand;

impl Command for ExitCommand {
    fn name(&self) -> &'static str {
        "exit"
    }

    fn describe(&self) -> &'static str {
        "Exit program."
    }

    fn execute(&self, _args: &Args, _ctx: &mut Context<'_>) -> Result<Flow> {
        Ok(Flow::Exit)
    }
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1}{}", UNITS[unit])
}
