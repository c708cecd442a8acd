/// Configuration file support for ringbus
///
/// Components read their config once at construction. Files may be TOML,
/// YAML or JSON; the format is picked from the extension and otherwise
/// guessed.
use crate::error::{RingbusError, RingbusResult};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

const EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Load a config of type `T` from a file (auto-detect format)
pub fn load_config<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> RingbusResult<T> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        RingbusError::config(format!(
            "Failed to read config file {}: {}",
            path.display(),
            e
        ))
    })?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => parse_toml(&contents),
        Some("yaml") | Some("yml") => parse_yaml(&contents),
        Some("json") => parse_json(&contents),
        _ => parse_toml(&contents).or_else(|_| parse_yaml(&contents)),
    }
}

/// Parse config from TOML string
pub fn parse_toml<T: DeserializeOwned>(contents: &str) -> RingbusResult<T> {
    Ok(toml::from_str(contents)?)
}

/// Parse config from YAML string
pub fn parse_yaml<T: DeserializeOwned>(contents: &str) -> RingbusResult<T> {
    Ok(serde_yaml::from_str(contents)?)
}

pub fn parse_json<T: DeserializeOwned>(contents: &str) -> RingbusResult<T> {
    Ok(serde_json::from_str(contents)?)
}

/// Standard locations for a config named `stem`
///
/// Search order:
/// 1. ./<stem>.{toml,yaml,yml,json}
/// 2. ~/.ringbus/<stem>.*
/// 3. /etc/ringbus/<stem>.*
pub fn search_paths(stem: &str) -> Vec<PathBuf> {
    let mut dirs_to_search = vec![PathBuf::from(".")];
    if let Some(home) = dirs::home_dir() {
        dirs_to_search.push(home.join(".ringbus"));
    }
    dirs_to_search.push(PathBuf::from("/etc/ringbus"));

    dirs_to_search
        .iter()
        .flat_map(|dir| {
            EXTENSIONS
                .iter()
                .map(move |ext| dir.join(format!("{}.{}", stem, ext)))
        })
        .collect()
}

/// First existing file among [`search_paths`]
pub fn find_config_file(stem: &str) -> Option<PathBuf> {
    search_paths(stem).into_iter().find(|path| path.is_file())
}

/// Find and load the config named `stem` from the standard locations
pub fn find_and_load<T: DeserializeOwned>(stem: &str) -> RingbusResult<T> {
    let path = find_config_file(stem).ok_or_else(|| {
        RingbusError::config(format!(
            "No config file named '{}' found in standard locations",
            stem
        ))
    })?;
    log::debug!("Loading config from {}", path.display());
    load_config(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;

    #[derive(Debug, Deserialize, PartialEq)]
    struct CounterConfig {
        topic: String,
        limit: u32,
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let expected = CounterConfig {
            topic: "/count".into(),
            limit: 10,
        };

        let toml = write_file(&dir, "c.toml", "topic = \"/count\"\nlimit = 10\n");
        let yaml = write_file(&dir, "c.yaml", "topic: /count\nlimit: 10\n");
        let json = write_file(&dir, "c.json", r#"{"topic": "/count", "limit": 10}"#);

        assert_eq!(load_config::<CounterConfig, _>(&toml).unwrap(), expected);
        assert_eq!(load_config::<CounterConfig, _>(&yaml).unwrap(), expected);
        assert_eq!(load_config::<CounterConfig, _>(&json).unwrap(), expected);
    }

    #[test]
    fn test_unknown_extension_falls_back_to_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "c.conf", "topic: /count\nlimit: 3\n");
        let config: CounterConfig = load_config(&path).unwrap();
        assert_eq!(config.limit, 3);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config::<CounterConfig, _>("/nonexistent/ringbus.toml").unwrap_err();
        assert!(matches!(err, RingbusError::Config(_)));
    }

    #[test]
    fn test_parse_error_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.toml", "topic = \n");
        assert!(matches!(
            load_config::<CounterConfig, _>(&path),
            Err(RingbusError::Config(_))
        ));
    }

    #[test]
    fn test_search_paths_order() {
        let paths = search_paths("counter");
        assert_eq!(paths[0], PathBuf::from("./counter.toml"));
        assert_eq!(
            paths.last().unwrap(),
            &PathBuf::from("/etc/ringbus/counter.json")
        );
    }
}
