//! Generational backups of the vault file.
//!
//! Backups live next to the vault as `<vault>-v<FORMAT_VERSION>.<generation>`.
//! Generation 1 is the newest. Rotation shifts every generation one slot
//! older, drops whatever falls past the limit, and copies the live file into
//! slot 1. Copies keep permissions and modification time.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{Result, VaultError};

/// On-disk format revision, embedded in backup file names.
pub const FORMAT_VERSION: &str = "1";

#[derive(Debug, Clone)]
pub struct BackupRotator {
    max_backups: usize,
}

impl BackupRotator {
    pub fn new(max_backups: usize) -> Self {
        Self { max_backups }
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Path of backup `generation` for `vault`.
    pub fn backup_path(vault: &Path, generation: usize) -> PathBuf {
        let mut name = vault.as_os_str().to_os_string();
        name.push(format!("-v{FORMAT_VERSION}.{generation}"));
        PathBuf::from(name)
    }

    /// Existing backups of `vault` within the limit, newest first.
    pub fn existing(&self, vault: &Path) -> Vec<PathBuf> {
        (1..=self.max_backups)
            .map(|generation| Self::backup_path(vault, generation))
            .filter(|path| path.is_file())
            .collect()
    }

    /// Rotate backups and copy the live file into generation 1.
    ///
    /// A missing live file or a limit of zero makes this a no-op. Any failed
    /// copy aborts the rotation with [`VaultError::Backup`]; the live file is
    /// never touched.
    pub fn rotate(&self, vault: &Path) -> Result<()> {
        if self.max_backups == 0 {
            debug!("backups disabled, skipping rotation");
            return Ok(());
        }
        if !vault.is_file() {
            debug!(path = %vault.display(), "no live vault yet, nothing to back up");
            return Ok(());
        }

        self.discard_beyond_limit(vault)?;

        // The oldest generation would land past the limit, so it is simply
        // overwritten by the shift below.
        for generation in (1..self.max_backups).rev() {
            let from = Self::backup_path(vault, generation);
            if from.is_file() {
                let to = Self::backup_path(vault, generation + 1);
                debug!(from = %from.display(), to = %to.display(), "shifting backup");
                copy_preserving(&from, &to)?;
            }
        }

        let newest = Self::backup_path(vault, 1);
        copy_preserving(vault, &newest)?;
        debug!(backup = %newest.display(), "vault backed up");
        Ok(())
    }

    fn discard_beyond_limit(&self, vault: &Path) -> Result<()> {
        let mut generation = self.max_backups + 1;
        loop {
            let stale = Self::backup_path(vault, generation);
            if !stale.is_file() {
                return Ok(());
            }
            warn!(path = %stale.display(), "removing backup beyond configured limit");
            fs::remove_file(&stale).map_err(|e| VaultError::backup(&stale, e))?;
            generation += 1;
        }
    }
}

fn copy_preserving(from: &Path, to: &Path) -> Result<()> {
    fs::copy(from, to).map_err(|e| VaultError::backup(to, e))?;
    let modified = fs::metadata(from)
        .and_then(|meta| meta.modified())
        .map_err(|e| VaultError::backup(from, e))?;
    File::options()
        .write(true)
        .open(to)
        .and_then(|file| file.set_modified(modified))
        .map_err(|e| VaultError::backup(to, e))?;
    Ok(())
}
