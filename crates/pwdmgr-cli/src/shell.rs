use pwdmgr_core::{AccountStore, Settings};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{debug, error};

use crate::commands::{Context, Flow, Registry, UsageError};
use crate::console::{Cancelled, Console};

const PROMPT: &str = "pwdmgr> ";

/// Read-dispatch loop over the command registry.
pub struct Shell {
    registry: Registry,
    store: AccountStore,
    settings: Settings,
    settings_path: PathBuf,
    console: Console,
}

impl Shell {
    pub fn new(
        registry: Registry,
        store: AccountStore,
        settings: Settings,
        settings_path: PathBuf,
        console: Console,
    ) -> Self {
        Self {
            registry,
            store,
            settings,
            settings_path,
            console,
        }
    }

    /// Interactive loop; returns on `exit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            let Some(line) = self.console.read_line(PROMPT)? else {
                writeln!(self.console.out())?;
                return Ok(());
            };
            if self.dispatch(&line)? == Flow::Exit {
                return Ok(());
            }
        }
    }

    /// Run each line as if typed at the prompt, then return.
    pub fn run_lines(&mut self, lines: &[String]) -> io::Result<()> {
        for line in lines {
            if self.dispatch(line)? == Flow::Exit {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command line. Command failures are reported to the user
    /// and logged; only a failure to write to the console is returned.
    pub fn dispatch(&mut self, line: &str) -> io::Result<Flow> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(Flow::Continue);
        };
        let name = name.to_ascii_lowercase();
        let raw: Vec<&str> = words.collect();

        let Some(command) = self.registry.get(&name) else {
            writeln!(
                self.console.out(),
                "Unknown command '{name}'. Type 'help' for a list of commands."
            )?;
            return Ok(Flow::Continue);
        };
        debug!(command = %name, args = raw.len(), "dispatch");

        let result = match command.parse_args(&raw) {
            Ok(args) => {
                let mut ctx = Context {
                    store: &mut self.store,
                    settings: &mut self.settings,
                    settings_path: &self.settings_path,
                    console: &mut self.console,
                    registry: &self.registry,
                };
                command.execute(&args, &mut ctx)
            }
            Err(e) => Err(e),
        };

        let out = self.console.out();
        match result {
            Ok(flow) => Ok(flow),
            Err(e) if e.is::<UsageError>() => {
                writeln!(out, "Wrong number of arguments.")?;
                writeln!(out, "Usage: {} {}", command.name(), command.usage())?;
                Ok(Flow::Continue)
            }
            Err(e) if e.is::<Cancelled>() => {
                writeln!(out)?;
                writeln!(out, "Cancelled.")?;
                Ok(Flow::Continue)
            }
            Err(e) => {
                error!(command = %name, "{e:#}");
                writeln!(out, "[ERROR]: {e:#}")?;
                Ok(Flow::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::testing::{scripted, SharedOutput};
    use pwdmgr_core::{BackupRotator, VaultKey};
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn shell(dir: &Path, input: &str) -> (Shell, SharedOutput) {
        let key = VaultKey::from_passphrase("shell tests").unwrap();
        let store = AccountStore::new(dir.join("accounts.vault"), key, 2);
        let settings = Settings {
            max_password_file_backups: 2,
            ..Settings::default()
        };
        let (console, output) = scripted(input);
        let shell = Shell::new(
            Registry::standard(),
            store,
            settings,
            dir.join("config.json"),
            console,
        );
        (shell, output)
    }

    fn lines(commands: &[&str]) -> Vec<String> {
        commands.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn add_then_view_shows_the_account() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "github.com\nbob\n\nhunter22\nwork\n");
        shell.run_lines(&lines(&["add github", "view git"])).unwrap();

        let text = output.text();
        assert!(text.contains("Account 'github' added."));
        assert!(text.contains("USERNAME   bob"));
        assert!(text.contains("PASSWORD   hunter22"));
    }

    #[test]
    fn list_masks_passwords_by_default() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "\n\n\nsecretpw\n\n");
        shell.run_lines(&lines(&["add mail", "list"])).unwrap();

        let text = output.text();
        assert!(text.contains("********"));
        assert!(!text.contains("secretpw"));
        assert!(text.contains("PASSWORD"));
    }

    #[test]
    fn list_of_empty_vault_hints_at_add() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        shell.run_lines(&lines(&["list"])).unwrap();
        assert!(output.text().contains("No accounts. Add accounts using add-command."));
    }

    #[test]
    fn modify_rewrites_and_keeps_a_backup() {
        let dir = tempdir().unwrap();
        let input = "\n\n\npw-one\n\nyes\n\n\n\n\npw-two\n\n";
        let (mut shell, output) = shell(dir.path(), input);
        shell.run_lines(&lines(&["add site"])).unwrap();
        let before = fs::read(dir.path().join("accounts.vault")).unwrap();

        shell.run_lines(&lines(&["modify si", "view site"])).unwrap();

        let text = output.text();
        assert!(text.contains("Account updated."));
        assert!(text.contains("PASSWORD   pw-two"));
        let backup = BackupRotator::backup_path(&dir.path().join("accounts.vault"), 1);
        assert_eq!(fs::read(backup).unwrap(), before);
    }

    #[test]
    fn empty_password_answer_stores_the_offered_password() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "\n\n\np\n\n\n");
        shell.run_lines(&lines(&["add gen", "view gen"])).unwrap();

        let text = output.text();
        let offered: Vec<&str> = text
            .split("Password (")
            .skip(1)
            .filter_map(|rest| rest.split_once("): ").map(|(pw, _)| pw))
            .collect();
        assert_eq!(offered.len(), 2);
        assert_ne!(offered[0], offered[1]);
        assert!(text.contains(&format!("PASSWORD   {}", offered[1])));
    }

    #[test]
    fn modify_keeps_original_password_on_c() {
        let dir = tempdir().unwrap();
        let input = "\n\n\noriginal-pw\n\nyes\n\n\n\n\np\nc\n\n";
        let (mut shell, output) = shell(dir.path(), input);
        shell.run_lines(&lines(&["add site", "modify site", "view site"])).unwrap();

        let text = output.text();
        assert!(text.contains("Account updated."));
        assert!(text.contains("PASSWORD   original-pw"));
    }

    #[test]
    fn declined_delete_keeps_the_account() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "\n\n\npw\n\nno\nyes\n");
        shell
            .run_lines(&lines(&["add keep", "delete keep", "delete keep", "list"]))
            .unwrap();

        let text = output.text();
        assert_eq!(text.matches("Account deleted.").count(), 1);
        assert!(text.contains("No accounts."));
    }

    #[test]
    fn eof_mid_prompt_cancels_without_writing() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "github.com\n");
        shell.run_lines(&lines(&["add github"])).unwrap();

        assert!(output.text().contains("Cancelled."));
        assert!(!dir.path().join("accounts.vault").exists());
    }

    #[test]
    fn unknown_commands_and_bad_arity_are_reported() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        shell.run_lines(&lines(&["FROB", "view", "   "])).unwrap();

        let text = output.text();
        assert!(text.contains("Unknown command 'frob'. Type 'help' for a list of commands."));
        assert!(text.contains("Wrong number of arguments."));
        assert!(text.contains("Usage: view <start of name>"));
    }

    #[test]
    fn command_names_are_case_insensitive() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        shell.run_lines(&lines(&["HELP"])).unwrap();
        assert!(output.text().contains("pwgen"));
    }

    #[test]
    fn exit_stops_remaining_lines() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        assert_eq!(shell.dispatch("exit").unwrap(), Flow::Exit);
        shell.run_lines(&lines(&["exit", "help"])).unwrap();
        assert!(!output.text().contains("Commands:"));
    }

    #[test]
    fn config_change_is_saved_and_applied() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        shell
            .run_lines(&lines(&["config max_password_file_backups=5", "config nonsense"]))
            .unwrap();

        assert_eq!(shell.store.rotator().max_backups(), 5);
        let saved = Settings::load(&dir.path().join("config.json")).unwrap();
        assert_eq!(saved.max_password_file_backups, 5);
        assert!(output.text().contains("[ERROR]: nonsense not recognized"));
    }

    #[test]
    fn pwgen_honours_explicit_length() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "");
        shell.run_lines(&lines(&["pwgen 24"])).unwrap();
        let text = output.text();
        let password = text.lines().next().unwrap();
        assert_eq!(password.chars().count(), 24);
    }

    #[test]
    fn info_reports_account_count() {
        let dir = tempdir().unwrap();
        let (mut shell, output) = shell(dir.path(), "\n\n\npw\n\n");
        shell.run_lines(&lines(&["add one", "info"])).unwrap();
        let text = output.text();
        assert!(text.contains("Total accounts           : 1"));
        assert!(text.contains("Backups                  : 0"));
    }

    #[test]
    fn wrong_passphrase_is_reported_not_fatal() {
        let dir = tempdir().unwrap();
        let (mut shell, _) = shell(dir.path(), "\n\n\npw\n\n");
        shell.run_lines(&lines(&["add one"])).unwrap();

        let key = VaultKey::from_passphrase("not it").unwrap();
        let store = AccountStore::new(dir.path().join("accounts.vault"), key, 2);
        let (console, output) = scripted("");
        let mut other = Shell::new(
            Registry::standard(),
            store,
            Settings::default(),
            dir.path().join("config.json"),
            console,
        );
        assert_eq!(other.dispatch("list").unwrap(), Flow::Continue);
        assert!(output.text().contains("[ERROR]: authentication failed"));
    }
}
