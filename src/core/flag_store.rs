//! Persisted integer flags in a flat `name=value` text file
//!
//! Flags share the file with arbitrary other lines, which are preserved
//! byte for byte. A line belongs to a flag when it contains the flag name as a
//! substring; lookup keeps the last matching line and update rewrites every
//! matching line.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use tokio::{fs, sync::Mutex};
use tracing::{debug, warn};

use crate::core::error::{ConfigError, ConfigResult};

/// Find the value of `name` in `content`
///
/// Returns `Ok(None)` if no line mentions `name`.
pub fn lookup_flag(content: &str, name: &str) -> ConfigResult<Option<i64>> {
    let mut value = None;

    for line in content.split('\n').filter(|line| line.contains(name)) {
        let Some((_, raw)) = line.split_once('=') else {
            return Err(ConfigError::MissingSeparator {
                name: name.to_string(),
                line: line.to_string(),
            });
        };

        let raw = raw.trim();
        let parsed = raw.parse::<i64>().map_err(|source| ConfigError::Parse {
            name: name.to_string(),
            value: raw.to_string(),
            source,
        })?;

        value = Some(parsed);
    }

    Ok(value)
}

/// Replace every line mentioning one of the names with `name=value`
///
/// Later pairs win when several names match the same line. Names matching no
/// line are ignored.
pub fn rewrite_flags<N, V>(content: &str, updates: &[(N, V)]) -> String
where
    N: AsRef<str>,
    V: AsRef<str>,
{
    content
        .split('\n')
        .map(|line| {
            updates
                .iter()
                .filter(|(name, _)| line.contains(name.as_ref()))
                .last()
                .map(|(name, value)| format!("{}={}", name.as_ref(), value.as_ref()))
                .unwrap_or_else(|| line.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// File-backed flag store
///
/// All reads and writes go through one async mutex so concurrent callers
/// cannot interleave read-modify-write cycles.
#[derive(Debug)]
pub struct FlagStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FlagStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a flag, defaulting to 0 when the file has no matching line
    pub async fn read_flag(&self, name: &str) -> ConfigResult<i64> {
        let _guard = self.lock.lock().await;
        let content = self.read_file().await?;

        match lookup_flag(&content, name)? {
            Some(value) => {
                debug!(flag = name, value, "read flag");
                Ok(value)
            }
            None => {
                warn!(
                    flag = name,
                    path = %self.path.display(),
                    "flag not found, assuming 0"
                );
                Ok(0)
            }
        }
    }

    /// Rewrite the lines of the given flags
    ///
    /// The new content is written to a sibling file and renamed over the
    /// flag file. Readers never observe a partially written file.
    pub async fn write_flags<N, V>(&self, updates: &[(N, V)]) -> ConfigResult<()>
    where
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let _guard = self.lock.lock().await;
        let content = self.read_file().await?;
        let rewritten = rewrite_flags(&content, updates);

        if rewritten == content {
            debug!(path = %self.path.display(), "no flag line matched, file left unchanged");
            return Ok(());
        }

        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, rewritten.as_bytes())
            .await
            .map_err(|source| ConfigError::Write {
                path: tmp_path.clone(),
                source,
            })?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "flags written");
        Ok(())
    }

    async fn read_file(&self) -> ConfigResult<String> {
        fs::read_to_string(&self.path)
            .await
            .map_err(|source| ConfigError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}
