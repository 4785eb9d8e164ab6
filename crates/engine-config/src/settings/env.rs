use crate::settings::{
    command::CommandSettings, error::SettingsError, scan::ScanSettingsBuilder,
};
use std::{collections::HashMap, fs, path::Path, str::FromStr, time::Duration};
use tracing::debug;

pub const MAX_BATCH_COUNT: &str = "KVADMIN_MAX_BATCH_COUNT";
pub const TIMEOUT_MS: &str = "KVADMIN_TIMEOUT_MS";
pub const MAX_SPLIT_COUNT: &str = "KVADMIN_MAX_SPLIT_COUNT";
pub const PROGRESS_INTERVAL_MS: &str = "KVADMIN_PROGRESS_INTERVAL_MS";
pub const COMMAND_TIMEOUT_MS: &str = "KVADMIN_COMMAND_TIMEOUT_MS";

/// Variables loaded from the process environment and `.env` files.
/// Later sources override earlier ones.
#[derive(Debug, Clone, Default)]
pub struct EnvSettings {
    vars: HashMap<String, String>,
}

impl EnvSettings {
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars().collect(),
        }
    }

    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Loads `KEY=VALUE` lines; blank lines and `#` comments are skipped.
    pub fn load_from_file<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SettingsError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.parse_env_content(&content)?;
        debug!(path = %path.display(), "Loaded env file");
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    fn parse_env_content(&mut self, content: &str) -> Result<(), SettingsError> {
        for (line_num, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Err(SettingsError::EnvFile(format!(
                    "malformed line {} (expected KEY=VALUE)",
                    line_num + 1
                )));
            };
            let key = key.trim();
            if key.is_empty() {
                return Err(SettingsError::EnvFile(format!(
                    "empty key at line {}",
                    line_num + 1
                )));
            }
            self.vars.insert(key.to_string(), unquote(value));
        }
        Ok(())
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        match self.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| SettingsError::InvalidValue {
                    key: key.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    fn millis(&self, key: &str) -> Result<Option<Duration>, SettingsError> {
        Ok(self.parsed::<u64>(key)?.map(Duration::from_millis))
    }

    /// Applies `KVADMIN_*` scan overrides onto `builder`.
    pub fn apply_scan(
        &self,
        mut builder: ScanSettingsBuilder,
    ) -> Result<ScanSettingsBuilder, SettingsError> {
        if let Some(n) = self.parsed(MAX_BATCH_COUNT)? {
            builder = builder.max_batch_count(n);
        }
        if let Some(timeout) = self.millis(TIMEOUT_MS)? {
            builder = builder.timeout(timeout);
        }
        if let Some(n) = self.parsed(MAX_SPLIT_COUNT)? {
            builder = builder.max_split_count(n);
        }
        if let Some(interval) = self.millis(PROGRESS_INTERVAL_MS)? {
            builder = builder.progress_interval(interval);
        }
        Ok(builder)
    }

    pub fn command_settings(&self) -> Result<CommandSettings, SettingsError> {
        match self.millis(COMMAND_TIMEOUT_MS)? {
            Some(timeout) => CommandSettings::new(timeout),
            None => Ok(CommandSettings::default()),
        }
    }
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    let quoted = value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')));
    if quoted {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ScanSettings;
    use model::execution::operation::ScanOperation;
    use std::io::Write;

    #[test]
    fn test_parse_quoted_values() {
        let mut env = EnvSettings::default();
        let content = r#"
# Comment
QUOTED="value with spaces"
SINGLE='single quoted'
UNQUOTED=no_spaces
        "#;

        env.parse_env_content(content).unwrap();
        assert_eq!(env.get("QUOTED"), Some("value with spaces"));
        assert_eq!(env.get("SINGLE"), Some("single quoted"));
        assert_eq!(env.get("UNQUOTED"), Some("no_spaces"));
    }

    #[test]
    fn test_invalid_env_format() {
        let mut env = EnvSettings::default();
        assert!(env.parse_env_content("INVALID LINE WITHOUT EQUALS").is_err());
        assert!(env.parse_env_content("=value").is_err());
    }

    #[test]
    fn test_scan_overrides_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{MAX_BATCH_COUNT}=8").unwrap();
        writeln!(file, "{TIMEOUT_MS}=\"2500\"").unwrap();
        writeln!(file, "{COMMAND_TIMEOUT_MS}=750").unwrap();

        let mut env = EnvSettings::from_vars([(MAX_BATCH_COUNT, "1")]);
        env.load_from_file(file.path()).unwrap();

        let settings = env
            .apply_scan(ScanSettings::builder(ScanOperation::Copy))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(settings.max_batch_count, 8);
        assert_eq!(settings.timeout, Duration::from_millis(2500));
        assert_eq!(
            env.command_settings().unwrap().timeout,
            Duration::from_millis(750)
        );
    }

    #[test]
    fn test_bad_override_is_reported() {
        let env = EnvSettings::from_vars([(TIMEOUT_MS, "soon")]);
        let err = env
            .apply_scan(ScanSettings::builder(ScanOperation::Clear))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue { ref key, .. } if key == TIMEOUT_MS));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut env = EnvSettings::default();
        assert!(matches!(
            env.load_from_file(dir.path().join("absent.env")),
            Err(SettingsError::Io { .. })
        ));
    }
}
