use anyhow::{anyhow, Result};
use clap::Parser;
use pwdmgr_core::{crypto, paths, record};
use pwdmgr_core::{AccountStore, Settings, VaultKey};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use zeroize::Zeroizing;

mod commands;
mod console;
mod logging;
mod shell;

use crate::commands::{print_account, Registry};
use crate::console::Console;
use crate::shell::Shell;

#[derive(Parser, Debug)]
#[command(name = "pwdmgr", version, about = "Command line password manager", long_about = None)]
struct Cli {
    /// Vault file (default: $PWDMGR_FILE, then the user data directory)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// File that failed commands are logged to
    #[arg(long)]
    error_log: Option<PathBuf>,

    /// Vault passphrase; prompted for when absent
    #[arg(long, env = "PWDMGR_PASSPHRASE", hide_env_values = true)]
    passphrase: Option<String>,

    /// Run a command line and exit (repeatable)
    #[arg(short = 'c', long = "cmd", value_name = "COMMAND")]
    cmd: Vec<String>,

    /// Decrypt a single vault line, print it and exit
    #[arg(short, long, value_name = "TOKEN")]
    decrypt: Option<String>,

    /// Show debug output
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = match cli.config {
        Some(path) => path,
        None => paths::config_file()?,
    };
    let settings = Settings::load(&settings_path)?;
    let error_log = match cli.error_log {
        Some(path) => path,
        None => paths::error_log_file()?,
    };
    logging::init(cli.debug || settings.show_debug, &error_log)?;

    let vault_path = paths::vault_file(cli.file)?;
    println!("pwdmgr v{}", env!("CARGO_PKG_VERSION"));

    let passphrase = read_passphrase(cli.passphrase)?;
    let key = VaultKey::from_passphrase(&passphrase)?;
    if let Some(token) = cli.decrypt {
        return decrypt_line(&key, &token);
    }
    info!(vault = %vault_path.display(), "vault selected");

    let store = AccountStore::new(vault_path, key, settings.max_password_file_backups);
    let mut shell = Shell::new(
        Registry::standard(),
        store,
        settings,
        settings_path,
        Console::stdio(),
    );
    if cli.cmd.is_empty() {
        shell.run()?;
    } else {
        shell.run_lines(&cli.cmd)?;
    }
    Ok(())
}

/// Show one record on its own, for finding and repairing a line that stops
/// the vault from loading. Plaintext that is not a valid record is printed
/// as is.
fn decrypt_line(key: &VaultKey, token: &str) -> Result<()> {
    let plain = crypto::decrypt(key, token.trim())?;
    let mut out = io::stdout().lock();
    match record::parse(&plain) {
        Ok(account) => print_account(&mut out, &account)?,
        Err(e) => {
            warn!(error = %e, "decrypted line is not a valid record");
            writeln!(out, "{}", plain.as_str())?;
        }
    }
    Ok(())
}

fn read_passphrase(given: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(passphrase) = given {
        return Ok(Zeroizing::new(passphrase));
    }
    let passphrase = rpassword::prompt_password("Passphrase (CTRL-C to quit): ")
        .map_err(|e| anyhow!("passphrase prompt: {e}"))?;
    Ok(Zeroizing::new(passphrase))
}
