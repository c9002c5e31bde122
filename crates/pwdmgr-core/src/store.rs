//! The vault file: one encrypted record per line.
//!
//! Creation appends a single line and leaves existing lines alone. Any other
//! mutation rewrites the whole file, after a successful backup rotation, via a
//! temp file in the same directory that is then renamed over the vault.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, error, info};

use crate::backup::BackupRotator;
use crate::crypto::{self, VaultKey};
use crate::error::{Result, VaultError};
use crate::record::{self, Account};

#[derive(Debug)]
pub struct AccountStore {
    path: PathBuf,
    key: VaultKey,
    rotator: BackupRotator,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>, key: VaultKey, max_backups: usize) -> Self {
        Self {
            path: path.into(),
            key,
            rotator: BackupRotator::new(max_backups),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn rotator(&self) -> &BackupRotator {
        &self.rotator
    }

    pub fn set_max_backups(&mut self, max_backups: usize) {
        self.rotator = BackupRotator::new(max_backups);
    }

    /// Decrypt and parse every record. A missing file is an empty vault; any
    /// bad line fails the whole load.
    pub fn load(&self) -> Result<Vec<Account>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no vault file yet");
                return Ok(Vec::new());
            }
            Err(e) => return Err(VaultError::io(&self.path, e)),
        };

        let mut accounts = Vec::new();
        for (index, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| VaultError::io(&self.path, e))?;
            // Tokens are base64, so a line that is not UTF-8 is a damaged token.
            let token = std::str::from_utf8(&line)
                .map_err(|_| VaultError::Authentication)
                .inspect_err(|e| error!(line = index + 1, error = %e, "unreadable vault record"))?
                .trim();
            if token.is_empty() {
                continue;
            }
            let account = crypto::decrypt(&self.key, token)
                .and_then(|plain| record::parse(&plain))
                .inspect_err(|e| error!(line = index + 1, error = %e, "unreadable vault record"))?;
            accounts.push(account);
        }
        debug!(count = accounts.len(), "vault loaded");
        Ok(accounts)
    }

    /// Append one account as a new line, creating the file if needed.
    pub fn append_account(&self, account: &Account) -> Result<()> {
        let Some(token) = crypto::encrypt(&self.key, &record::serialize(account))? else {
            return Ok(());
        };
        self.ensure_parent_dir()?;

        let mut options = OpenOptions::new();
        options.read(true).append(true).create(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| VaultError::io(&self.path, e))?;

        let mut line = String::with_capacity(token.len() + 2);
        if !ends_with_newline(&mut file).map_err(|e| VaultError::io(&self.path, e))? {
            line.push('\n');
        }
        line.push_str(&token);
        line.push('\n');
        file.write_all(line.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|e| VaultError::io(&self.path, e))?;
        info!(path = %self.path.display(), "account appended");
        Ok(())
    }

    /// Replace the file's contents with `accounts`, after rotating backups.
    /// If rotation fails the live file is left exactly as it was.
    pub fn rewrite_all(&self, accounts: &[Account]) -> Result<()> {
        self.rotator.rotate(&self.path)?;
        self.ensure_parent_dir()?;

        let dir = self.parent_dir();
        let mut tmp = NamedTempFile::new_in(&dir).map_err(|e| VaultError::io(&dir, e))?;
        for account in accounts {
            if let Some(token) = crypto::encrypt(&self.key, &record::serialize(account))? {
                writeln!(tmp, "{token}").map_err(|e| VaultError::io(tmp.path(), e))?;
            }
        }
        tmp.as_file()
            .sync_all()
            .map_err(|e| VaultError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| VaultError::io(&self.path, e.error))?;
        sync_dir(&dir).map_err(|e| VaultError::io(&dir, e))?;
        info!(path = %self.path.display(), count = accounts.len(), "vault rewritten");
        Ok(())
    }

    fn parent_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    fn ensure_parent_dir(&self) -> Result<()> {
        let dir = self.parent_dir();
        fs::create_dir_all(&dir).map_err(|e| VaultError::io(&dir, e))
    }
}

/// Flush the directory entry so a completed rename survives a crash.
#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}
