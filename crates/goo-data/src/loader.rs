//! Data file plumbing: format detection (RON/JSON/TOML), file discovery,
//! and (de)serialization helpers shared by every file-backed pusher.

use goo_core::config::ResolverConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A serialization error occurred.
    #[error("encode error for {file}: {detail}")]
    Encode { file: PathBuf, detail: String },

    /// A definition is structurally valid but unusable.
    #[error("invalid entry '{name}' in {file}: {reason}")]
    Invalid {
        file: PathBuf,
        name: String,
        reason: &'static str,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

impl Format {
    pub fn extension(self) -> &'static str {
        match self {
            Format::Ron => "ron",
            Format::Toml => "toml",
            Format::Json => "json",
        }
    }
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let extensions = ["ron", "toml", "json"];
    let mut found: Option<PathBuf> = None;

    for ext in &extensions {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if candidate.exists() {
            if let Some(ref existing) = found {
                return Err(DataLoadError::ConflictingFormats {
                    a: existing.clone(),
                    b: candidate,
                });
            }
            found = Some(candidate);
        }
    }

    Ok(found)
}

// ===========================================================================
// (De)serialization
// ===========================================================================

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let parse_err = |detail: String| DataLoadError::Parse {
        file: path.to_path_buf(),
        detail,
    };

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
    }
}

/// Deserialize `{base_name}.*` from `dir`, or `T::default()` if no such file exists.
pub fn load_optional<T: DeserializeOwned + Default>(
    dir: &Path,
    base_name: &str,
) -> Result<T, DataLoadError> {
    match find_data_file(dir, base_name)? {
        Some(path) => deserialize_file(&path),
        None => Ok(T::default()),
    }
}

/// Serialize `value` to `path` in the format its extension names,
/// creating parent directories.
pub fn write_file<T: Serialize>(path: &Path, value: &T) -> Result<(), DataLoadError> {
    let format = detect_format(path)?;
    let encode_err = |detail: String| DataLoadError::Encode {
        file: path.to_path_buf(),
        detail,
    };

    let content = match format {
        Format::Ron => ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())
            .map_err(|e| encode_err(e.to_string()))?,
        Format::Json => {
            serde_json::to_string_pretty(value).map_err(|e| encode_err(e.to_string()))?
        }
        Format::Toml => toml::to_string_pretty(value).map_err(|e| encode_err(e.to_string()))?,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, content)?;
    Ok(())
}

/// Load `resolver.*` from `dir`, falling back to defaults when absent.
pub fn load_resolver_config(dir: &Path) -> Result<ResolverConfig, DataLoadError> {
    load_optional(dir, "resolver")
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ValueTable;
    use goo_core::test_utils::scratch_dir;
    use std::fs;

    // -----------------------------------------------------------------------
    // detect_format
    // -----------------------------------------------------------------------

    #[test]
    fn detect_format_by_extension() {
        assert_eq!(detect_format(Path::new("values.ron")).unwrap(), Format::Ron);
        assert_eq!(detect_format(Path::new("values.toml")).unwrap(), Format::Toml);
        assert_eq!(detect_format(Path::new("values.json")).unwrap(), Format::Json);
    }

    #[test]
    fn detect_format_unsupported() {
        for name in ["values.yaml", "values"] {
            assert!(matches!(
                detect_format(Path::new(name)),
                Err(DataLoadError::UnsupportedFormat { .. })
            ));
        }
    }

    // -----------------------------------------------------------------------
    // find_data_file
    // -----------------------------------------------------------------------

    #[test]
    fn find_data_file_found_and_missing() {
        let dir = scratch_dir("data_find");
        assert_eq!(find_data_file(&dir, "values").unwrap(), None);

        fs::write(dir.join("values.toml"), "").unwrap();
        assert_eq!(
            find_data_file(&dir, "values").unwrap(),
            Some(dir.join("values.toml"))
        );
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn find_data_file_conflict() {
        let dir = scratch_dir("data_conflict");
        fs::write(dir.join("denied.ron"), "()").unwrap();
        fs::write(dir.join("denied.json"), "{}").unwrap();

        assert!(matches!(
            find_data_file(&dir, "denied"),
            Err(DataLoadError::ConflictingFormats { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    // -----------------------------------------------------------------------
    // (De)serialization
    // -----------------------------------------------------------------------

    #[test]
    fn write_then_read_every_format() {
        let dir = scratch_dir("data_formats");
        let mut table = ValueTable::default();
        table.values.insert("minecraft:cobblestone".to_string(), 1.0);
        table.values.insert("minecraft:diamond".to_string(), 800.25);

        for format in [Format::Ron, Format::Json, Format::Toml] {
            let path = dir.join(format!("values.{}", format.extension()));
            write_file(&path, &table).unwrap();
            let back: ValueTable = deserialize_file(&path).unwrap();
            assert_eq!(back, table, "format {format:?}");
        }
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = scratch_dir("data_malformed");
        let path = dir.join("values.json");
        fs::write(&path, "{ \"values\": [").unwrap();
        assert!(matches!(
            deserialize_file::<ValueTable>(&path),
            Err(DataLoadError::Parse { .. })
        ));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_optional_defaults_when_absent() {
        let dir = scratch_dir("data_optional");
        let table: ValueTable = load_optional(&dir, "values").unwrap();
        assert!(table.values.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn resolver_config_from_toml() {
        let dir = scratch_dir("data_resolver_config");
        assert_eq!(load_resolver_config(&dir).unwrap(), ResolverConfig::default());

        fs::write(
            dir.join("resolver.toml"),
            "max_outer_passes = 12\nsnapshot_file = \"final.json\"\n",
        )
        .unwrap();
        let config = load_resolver_config(&dir).unwrap();
        assert_eq!(config.max_outer_passes, 12);
        assert_eq!(config.snapshot_file, "final.json");
        let _ = fs::remove_dir_all(&dir);
    }
}
