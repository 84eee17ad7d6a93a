//! Environment key-value mapping and `${KEY}` template rendering.

use std::collections::BTreeMap;
use std::path::Path;

use crate::config::loader::ConfigError;

/// Keys that must be present before the environment counts as configured.
pub const REQUIRED_KEYS: [&str; 4] = ["DB_USER", "DB_PASSWORD", "DB_HOST", "MOCK_API_PORT"];

/// Resolved environment configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    values: BTreeMap<String, String>,
}

impl Environment {
    /// Build an environment from explicit values only.
    pub fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// Overlay `base` with values from `lookup` for every known or required key.
    pub fn with_overrides<F>(base: &BTreeMap<String, String>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = base.clone();
        let keys: Vec<String> = base
            .keys()
            .cloned()
            .chain(REQUIRED_KEYS.iter().map(|k| k.to_string()))
            .collect();

        for key in keys {
            if let Some(value) = lookup(&key) {
                values.insert(key, value);
            }
        }

        Self { values }
    }

    /// Layer `base`, then the dotenv file at `dotenv_path`, then `lookup`.
    pub fn layered<F>(
        base: &BTreeMap<String, String>,
        dotenv_path: &Path,
        lookup: F,
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut values = base.clone();
        values.extend(read_dotenv(dotenv_path)?);
        Ok(Self::with_overrides(&values, lookup))
    }

    /// Layer `base`, the dotenv file and the process environment.
    pub fn from_process(
        base: &BTreeMap<String, String>,
        dotenv_path: &Path,
    ) -> Result<Self, ConfigError> {
        Self::layered(base, dotenv_path, |key| std::env::var(key).ok())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fail with every missing key, not just the first.
    pub fn require(&self, keys: &[&str]) -> Result<(), ConfigError> {
        let missing: Vec<String> = keys
            .iter()
            .filter(|key| !self.values.contains_key(**key))
            .map(|key| key.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingKeys(missing))
        }
    }

    /// Replace each `${KEY}` in `template` with its value.
    pub fn render(&self, template: &str) -> Result<String, ConfigError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}').ok_or_else(|| ConfigError::Template {
                template: template.to_string(),
                reason: "unterminated placeholder".to_string(),
            })?;

            let key = &after[..end];
            let value = self.get(key).ok_or_else(|| ConfigError::Template {
                template: template.to_string(),
                reason: format!("unknown key '{}'", key),
            })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }

        out.push_str(rest);
        Ok(out)
    }

    /// Render every element of an argv template.
    pub fn render_all(&self, templates: &[String]) -> Result<Vec<String>, ConfigError> {
        templates.iter().map(|t| self.render(t)).collect()
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file yields no values.
pub fn read_dotenv(path: &Path) -> Result<BTreeMap<String, String>, ConfigError> {
    let dotenv_error = |e: dotenvy::Error| ConfigError::Dotenv {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let entries = match dotenvy::from_path_iter(path) {
        Ok(entries) => entries,
        Err(e) if e.not_found() => {
            tracing::debug!(path = %path.display(), "Dotenv file not found");
            return Ok(BTreeMap::new());
        }
        Err(e) => return Err(dotenv_error(e)),
    };

    entries.map(|entry| entry.map_err(dotenv_error)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Environment {
        Environment::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut base = BTreeMap::new();
        base.insert("DB_USER".to_string(), "root".to_string());
        base.insert("EXTRA".to_string(), "file".to_string());

        let env = Environment::with_overrides(&base, |key| match key {
            "DB_USER" => Some("dev".to_string()),
            "MOCK_API_PORT" => Some("7000".to_string()),
            _ => None,
        });

        assert_eq!(env.get("DB_USER"), Some("dev"));
        assert_eq!(env.get("EXTRA"), Some("file"));
        assert_eq!(env.get("MOCK_API_PORT"), Some("7000"));
    }

    fn dotenv(contents: &str) -> tempfile::NamedTempFile {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_dotenv_supplies_required_keys() {
        let file = dotenv("DB_USER=root\nDB_PASSWORD=secret\n# comment\nDB_HOST=localhost\nMOCK_API_PORT=6000\n");

        let env = Environment::layered(&BTreeMap::new(), file.path(), |_| None).unwrap();
        assert!(env.require(&REQUIRED_KEYS).is_ok());
        assert_eq!(env.get("DB_PASSWORD"), Some("secret"));
        assert_eq!(env.get("MOCK_API_PORT"), Some("6000"));
    }

    #[test]
    fn test_dotenv_sits_between_table_and_process() {
        let file = dotenv("DB_USER=from_dotenv\nDB_HOST=db\n");
        let mut base = BTreeMap::new();
        base.insert("DB_USER".to_string(), "from_table".to_string());
        base.insert("DB_PASSWORD".to_string(), "table_only".to_string());

        let env = Environment::layered(&base, file.path(), |key| {
            (key == "DB_HOST").then(|| "from_process".to_string())
        })
        .unwrap();

        assert_eq!(env.get("DB_USER"), Some("from_dotenv"));
        assert_eq!(env.get("DB_PASSWORD"), Some("table_only"));
        assert_eq!(env.get("DB_HOST"), Some("from_process"));
    }

    #[test]
    fn test_missing_dotenv_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut base = BTreeMap::new();
        base.insert("DB_USER".to_string(), "root".to_string());

        let env = Environment::layered(&base, &dir.path().join(".env"), |_| None).unwrap();
        assert_eq!(env.get("DB_USER"), Some("root"));
    }

    #[test]
    fn test_malformed_dotenv_is_config_error() {
        let file = dotenv("DB_USER='unterminated\n");
        assert!(matches!(
            Environment::layered(&BTreeMap::new(), file.path(), |_| None),
            Err(ConfigError::Dotenv { .. })
        ));
    }

    #[test]
    fn test_require_lists_all_missing_keys() {
        let env = env(&[("DB_USER", "root")]);
        match env.require(&REQUIRED_KEYS) {
            Err(ConfigError::MissingKeys(keys)) => {
                assert_eq!(keys, vec!["DB_PASSWORD", "DB_HOST", "MOCK_API_PORT"]);
            }
            other => panic!("expected missing keys, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_value_counts_as_present() {
        let env = env(&[
            ("DB_USER", "root"),
            ("DB_PASSWORD", ""),
            ("DB_HOST", "localhost"),
            ("MOCK_API_PORT", "6000"),
        ]);
        assert!(env.require(&REQUIRED_KEYS).is_ok());
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let env = env(&[("MOCK_API_PORT", "6000"), ("DB_PASSWORD", "s3cret")]);
        assert_eq!(
            env.render("http://localhost:${MOCK_API_PORT}/health").unwrap(),
            "http://localhost:6000/health"
        );
        assert_eq!(env.render("-p${DB_PASSWORD}").unwrap(), "-ps3cret");
        assert_eq!(env.render("no placeholders").unwrap(), "no placeholders");
    }

    #[test]
    fn test_render_rejects_unknown_and_unterminated() {
        let env = env(&[]);
        assert!(matches!(
            env.render("${NOPE}"),
            Err(ConfigError::Template { .. })
        ));
        assert!(matches!(
            env.render("http://${MOCK_API_PORT"),
            Err(ConfigError::Template { .. })
        ));
    }
}
