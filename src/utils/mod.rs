use std::{env, fs, io, path::Path, path::PathBuf, sync::Once};

use dirs::home_dir;

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIR_NAME: &str = ".recon_core";
const PROJECTS_DIR: &str = "projects";
const AUDIT_FILE: &str = "audit.jsonl";
const CONFIG_FILE: &str = "config.json";
const TMP_EXTENSION: &str = "tmp";

/// Returns the application-specific data directory, defaulting to `~/.recon_core`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("RECON_CORE_HOME") {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

/// Directory holding the per-project ledger files.
pub fn projects_dir_in(base: &Path) -> PathBuf {
    base.join(PROJECTS_DIR)
}

/// Path to the append-only audit log.
pub fn audit_file_in(base: &Path) -> PathBuf {
    base.join(AUDIT_FILE)
}

/// Path to the sync configuration file.
pub fn config_file_in(base: &Path) -> PathBuf {
    base.join(CONFIG_FILE)
}

/// Creates the directory (and parents) when missing.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Writes `contents` atomically by staging to a temporary sibling file.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let tmp = path.with_extension(TMP_EXTENSION);
    fs::write(&tmp, contents)?;
    fs::rename(tmp, path)?;
    Ok(())
}

/// Initializes the global tracing subscriber with sensible defaults.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, EnvFilter};

        let filter =
            EnvFilter::from_default_env().add_directive("recon_core=info".parse().unwrap());

        fmt().with_env_filter(filter).init();
    });
}
