use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_QUALIFIER: &str = "org";
pub const APP_ORG: &str = "pwdmgr";
pub const APP_NAME: &str = "pwdmgr";

/// Environment variable naming the vault file.
pub const VAULT_FILE_ENV: &str = "PWDMGR_FILE";

fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME)
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))
}

pub fn data_dir() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

pub fn config_file() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.json"))
}

pub fn error_log_file() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("error.log"))
}

/// Vault path: explicit override, then `PWDMGR_FILE`, then the data dir.
pub fn vault_file(explicit: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = std::env::var(VAULT_FILE_ENV) {
        if !path.is_empty() {
            return Ok(PathBuf::from(path));
        }
    }
    Ok(data_dir()?.join("accounts.vault"))
}
