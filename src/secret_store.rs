use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Separator used when flattening nested secret sections into keys
const SECTION_SEPARATOR: char = ':';

/// Read-only store of user secrets such as endpoint API keys.
///
/// Secrets live in a JSON file outside the project tree. Both flat keys
/// (`"AzureOpenAI:APIKey": "..."`) and nested sections
/// (`{"AzureOpenAI": {"APIKey": "..."}}`) are accepted; nested sections are
/// flattened with `:` so both forms are looked up the same way.
#[derive(Debug)]
pub struct SecretStore {
    secrets: HashMap<String, SecretString>,
    file_path: PathBuf,
}

impl SecretStore {
    /// Opens the store at the default location (`~/.quizbench/secrets.json`).
    ///
    /// # Returns
    ///
    /// * `io::Result<Self>` - The loaded store, or an IO error when the home
    ///   directory is unknown or the file cannot be read or parsed
    pub fn new() -> io::Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Opens the store at `file_path`. A missing file yields an empty store.
    ///
    /// # Arguments
    ///
    /// * `file_path` - JSON file holding flat or nested secrets
    ///
    /// # Returns
    ///
    /// * `io::Result<Self>` - The loaded store, or an IO error; malformed JSON
    ///   is reported as `io::ErrorKind::InvalidData`
    pub fn open(file_path: impl Into<PathBuf>) -> io::Result<Self> {
        let mut store = SecretStore {
            secrets: HashMap::new(),
            file_path: file_path.into(),
        };
        store.load()?;
        Ok(store)
    }

    /// Default location of the secrets file.
    pub fn default_path() -> io::Result<PathBuf> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not find home directory")
        })?;
        Ok(home_dir.join(".quizbench").join("secrets.json"))
    }

    fn load(&mut self) -> io::Result<()> {
        let contents = match fs::read_to_string(&self.file_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        let root: serde_json::Value = serde_json::from_str(&contents)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;
        let mut flat = HashMap::new();
        flatten_into(&mut flat, None, &root);
        self.secrets = flat
            .into_iter()
            .map(|(key, value)| (key, SecretString::new(value)))
            .collect();
        Ok(())
    }

    /// Retrieves a secret without exposing it as a String.
    ///
    /// # Arguments
    ///
    /// * `key` - Flattened key such as `AzureOpenAI:APIKey`
    ///
    /// # Returns
    ///
    /// * `Option<&SecretString>` - The secret if found, or None
    pub fn get_secret(&self, key: &str) -> Option<&SecretString> {
        self.secrets.get(key)
    }

    /// Retrieves a secret value for the given key.
    ///
    /// # Arguments
    ///
    /// * `key` - Flattened key such as `AzureOpenAI:Endpoint`
    ///
    /// # Returns
    ///
    /// * `Option<&String>` - The secret value if found, or None
    pub fn get(&self, key: &str) -> Option<&String> {
        self.secrets.get(key).map(|secret| secret.expose_secret())
    }

    /// Location the store was loaded from.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Number of secrets after flattening.
    pub fn len(&self) -> usize {
        self.secrets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.is_empty()
    }
}

fn flatten_into(out: &mut HashMap<String, String>, prefix: Option<&str>, value: &serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                let key = match prefix {
                    Some(prefix) => format!("{prefix}{SECTION_SEPARATOR}{key}"),
                    None => key.clone(),
                };
                flatten_into(out, Some(&key), child);
            }
        }
        serde_json::Value::String(s) => {
            if let Some(key) = prefix {
                out.insert(key.to_string(), s.clone());
            }
        }
        serde_json::Value::Null | serde_json::Value::Array(_) => {}
        other => {
            if let Some(key) = prefix {
                out.insert(key.to_string(), other.to_string());
            }
        }
    }
}
