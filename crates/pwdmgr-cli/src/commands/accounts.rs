use anyhow::Result;
use pwdmgr_core::generator::generate_password;
use pwdmgr_core::{Account, AccountFields, AccountPatch, Field, QueryEngine};
use std::io::Write;
use std::ops::RangeInclusive;

use super::{Args, Command, Context, Flow};
use crate::console::Console;

const MASK: &str = "********";
const LIST_COLUMNS: [Field; 6] = [
    Field::Name,
    Field::Url,
    Field::Username,
    Field::Email,
    Field::Password,
    Field::Comment,
];
const DETAIL_FIELDS: [Field; 8] = [
    Field::Name,
    Field::Url,
    Field::Username,
    Field::Email,
    Field::Password,
    Field::Created,
    Field::Updated,
    Field::Comment,
];

pub struct AddCommand;

impl Command for AddCommand {
    fn name(&self) -> &'static str {
        "add"
    }

    fn usage(&self) -> &'static str {
        "[<name>]"
    }

    fn describe(&self) -> &'static str {
        "Add new account."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        // Load first so a wrong passphrase fails before any typing.
        let mut engine = QueryEngine::open(ctx.store)?;

        let name = match args.get(0) {
            Some(name) => {
                writeln!(ctx.console.out(), "Name     : {name}")?;
                name.to_string()
            }
            None => loop {
                let name = ctx.console.ask("Name     : ")?;
                if !name.trim().is_empty() {
                    break name.trim().to_string();
                }
                writeln!(ctx.console.out(), "Empty name not accepted")?;
            },
        };
        let url = ctx.console.ask("URL      : ")?;
        let username = ctx.console.ask("User name: ")?;
        let email = ctx.console.ask("Email    : ")?;
        writeln!(
            ctx.console.out(),
            "Password generated. Type your password or type 'p' to generate new password."
        )?;
        let password = ask_password(ctx.console, ctx.settings.pwgen_length, None)?;
        let comment = ctx.console.ask("Comment  : ")?;

        let account = engine.create(AccountFields {
            name,
            username,
            url,
            email,
            password,
            comment,
        })?;
        writeln!(ctx.console.out(), "Account '{}' added.", account.name)?;
        Ok(Flow::Continue)
    }
}

pub struct ListCommand;

impl Command for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn usage(&self) -> &'static str {
        "[<start of name>]"
    }

    fn describe(&self) -> &'static str {
        "Print all accounts or all that match given start of name."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        0..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let engine = QueryEngine::open(ctx.store)?;
        if engine.is_empty() {
            writeln!(ctx.console.out(), "No accounts. Add accounts using add-command.")?;
            return Ok(Flow::Continue);
        }
        let rows = engine.select_by_name_prefix(args.get(0).unwrap_or(""));

        let width = ctx.settings.column_length;
        let header: Vec<String> = LIST_COLUMNS.iter().map(|f| f.to_string()).collect();
        writeln!(ctx.console.out(), "{}", table_row(&header, width))?;
        for account in &rows {
            let cells: Vec<String> = LIST_COLUMNS
                .iter()
                .map(|&field| match field {
                    Field::Password if ctx.settings.mask_password => MASK.to_string(),
                    _ => account.get(field).to_string(),
                })
                .collect();
            writeln!(ctx.console.out(), "{}", table_row(&cells, width))?;
        }
        Ok(Flow::Continue)
    }
}

pub struct ViewCommand;

impl Command for ViewCommand {
    fn name(&self) -> &'static str {
        "view"
    }

    fn usage(&self) -> &'static str {
        "<start of name>"
    }

    fn describe(&self) -> &'static str {
        "View account(s) details."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let engine = QueryEngine::open(ctx.store)?;
        let prefix = args.get(0).unwrap_or("");
        let rows = engine.select_by_name_prefix(prefix);
        if rows.is_empty() {
            writeln!(ctx.console.out(), "No accounts match '{prefix}'.")?;
        }
        for account in &rows {
            print_account(ctx.console.out(), account)?;
        }
        Ok(Flow::Continue)
    }
}

pub struct ModifyCommand;

impl Command for ModifyCommand {
    fn name(&self) -> &'static str {
        "modify"
    }

    fn usage(&self) -> &'static str {
        "<start of name>"
    }

    fn describe(&self) -> &'static str {
        "Modify account(s) that match given string."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let mut engine = QueryEngine::open(ctx.store)?;
        let prefix = args.get(0).unwrap_or("");
        // Materialized before any update touches the index.
        let rows = engine.select_by_name_prefix(prefix);
        if rows.is_empty() {
            writeln!(ctx.console.out(), "No accounts match '{prefix}'.")?;
        }

        for row in rows {
            print_account(ctx.console.out(), &row)?;
            if !ctx.console.confirm("Modify this account (yes/no)? ")? {
                continue;
            }
            let console = &mut *ctx.console;
            let name = console.ask_default("Name", &row.name)?;
            let url = console.ask_default("URL", &row.url)?;
            let username = console.ask_default("User name", &row.username)?;
            let email = console.ask_default("Email", &row.email)?;
            writeln!(
                console.out(),
                "Type your password, 'p' to generate password or 'c' to use original password."
            )?;
            let password =
                ask_password(console, ctx.settings.pwgen_length, Some(row.password.as_str()))?;
            let comment = console.ask_default("Comment", &row.comment)?;

            let patch = AccountPatch {
                name: Some(name),
                username: Some(username),
                url: Some(url),
                email: Some(email),
                password: Some(password),
                comment: Some(comment),
            };
            engine.update(&row.created, patch)?;
            writeln!(ctx.console.out(), "Account updated.")?;
        }
        Ok(Flow::Continue)
    }
}

pub struct DeleteCommand;

impl Command for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn usage(&self) -> &'static str {
        "<start of name>"
    }

    fn describe(&self) -> &'static str {
        "Delete account(s) that match given string."
    }

    fn arity(&self) -> RangeInclusive<usize> {
        1..=1
    }

    fn execute(&self, args: &Args, ctx: &mut Context<'_>) -> Result<Flow> {
        let mut engine = QueryEngine::open(ctx.store)?;
        let prefix = args.get(0).unwrap_or("");
        let rows = engine.select_by_name_prefix(prefix);
        if rows.is_empty() {
            writeln!(ctx.console.out(), "No accounts match '{prefix}'.")?;
        }

        for row in rows {
            print_account(ctx.console.out(), &row)?;
            if ctx.console.confirm("Delete this account (yes/no)? ")? {
                engine.delete(&row.created)?;
                writeln!(ctx.console.out(), "Account deleted.")?;
            }
        }
        Ok(Flow::Continue)
    }
}

/// Prompt for a password with a default shown in brackets: the `original`
/// when there is one, otherwise a generated password. An empty answer takes
/// the default, `p` offers a freshly generated one and `c` restores
/// `original`.
fn ask_password(console: &mut Console, length: usize, original: Option<&str>) -> Result<String> {
    let mut offered = match original {
        Some(original) => original.to_string(),
        None => generate_password(length)?,
    };
    loop {
        let answer = console.ask(&format!("Password ({offered}): "))?;
        let choice = answer.trim().to_ascii_lowercase();
        match (choice.as_str(), original) {
            ("", _) => return Ok(offered),
            ("p", _) => offered = generate_password(length)?,
            ("c", Some(original)) => return Ok(original.to_string()),
            _ => return Ok(answer),
        }
    }
}

pub(crate) fn print_account(out: &mut dyn Write, account: &Account) -> std::io::Result<()> {
    writeln!(out, "===============================")?;
    for field in DETAIL_FIELDS {
        writeln!(out, "{:<10} {}", field.as_str(), account.get(field))?;
    }
    Ok(())
}

fn table_row(cells: &[String], width: usize) -> String {
    cells
        .iter()
        .map(|cell| format!("{:^width$}", shorten(cell, width)))
        .collect::<Vec<_>>()
        .join("|")
}

/// Cut `value` to `width` characters, marking the cut with "...".
fn shorten(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let keep = width.saturating_sub(3);
    let mut short: String = value.chars().take(keep).collect();
    short.push_str("...");
    short
}
