//!
//! # Serialization & Deserialization Utilities
//!
//! Convenience traits for saving and loading [serde]-serializable data.
//! The serde-visible parts of the project model - configuration line lists,
//! workspace reference summaries - implement [`SerdeFile`]; the heterogeneous
//! object graph, which holds weak pointers, does not.
//!
//! Two formats are supported, the two those data models are exchanged as:
//! JSON and YAML. Saving goes through the same atomic-replace discipline as
//! the format writers, so a crashed save never truncates an existing file.
//!

// Standard Lib Imports
use std::path::Path;

// Crates.io Imports
use serde::de::DeserializeOwned;
use serde::Serialize;

// Local Imports
use crate::paths::write_atomic;

/// # Enumerated First-Class-Supported Serialization Formats
#[derive(Clone, Copy)]
pub enum SerializationFormat {
    Json,
    Yaml,
}
impl SerializationFormat {
    /// Convert any [serde::Serialize] data to a serialized string
    pub fn to_string(&self, data: &impl Serialize) -> Result<String, Error> {
        match *self {
            Self::Json => Ok(serde_json::to_string_pretty(data)?),
            Self::Yaml => Ok(serde_yaml::to_string(data)?),
        }
    }
    /// Parse string `s`
    pub fn from_str<T: DeserializeOwned>(&self, s: &str) -> Result<T, Error> {
        match *self {
            Self::Json => Ok(serde_json::from_str(s)?),
            Self::Yaml => Ok(serde_yaml::from_str(s)?),
        }
    }
    /// Save `data` to file `fname`, replacing it atomically
    pub fn save(&self, data: &impl Serialize, fname: impl AsRef<Path>) -> Result<(), Error> {
        let s = self.to_string(data)?;
        write_atomic(fname.as_ref(), &s)?;
        Ok(())
    }
    /// Load from file at path `fname`
    pub fn open<T: DeserializeOwned>(&self, fname: impl AsRef<Path>) -> Result<T, Error> {
        let s = std::fs::read_to_string(fname)?;
        self.from_str(&s)
    }
}

/// Serialization to & from file trait
///
/// Includes:
/// * `open` for loading from file
/// * `save` for saving to file
///
/// Fully default-implemented, allowing empty implementations
/// for types that implement [serde] serialization and deserialization.
///
pub trait SerdeFile: Serialize + DeserializeOwned {
    /// Save in `fmt`-format to file `fname`
    fn save(&self, fname: impl AsRef<Path>, fmt: SerializationFormat) -> Result<(), Error> {
        fmt.save(self, fname)
    }
    /// Open from `fmt`-format file `fname`
    fn open(fname: impl AsRef<Path>, fmt: SerializationFormat) -> Result<Self, Error> {
        fmt.open(fname)
    }
}

/// Wrapper over the underlying serializer and I/O errors
#[derive(Debug)]
pub struct Error(Box<dyn std::error::Error>);

impl std::fmt::Display for Error {
    /// Delegate [`Display`] to the wrapped error
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}
impl std::error::Error for Error {}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self(Box::new(e))
    }
}
impl From<serde_yaml::Error> for Error {
    fn from(e: serde_yaml::Error) -> Self {
        Self(Box::new(e))
    }
}
impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Self(Box::new(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: usize,
    }
    impl SerdeFile for Sample {}

    #[test]
    fn test_string_round_trip() {
        let sample = Sample {
            name: "a b".to_string(),
            count: 3,
        };
        for fmt in [SerializationFormat::Json, SerializationFormat::Yaml] {
            let s = fmt.to_string(&sample).unwrap();
            let back: Sample = fmt.from_str(&s).unwrap();
            assert_eq!(back, sample);
        }
    }
    #[test]
    fn test_save_and_open() {
        let sample = Sample {
            name: "on disk".to_string(),
            count: 1,
        };
        let dir = std::env::temp_dir().join(format!("xcode21-ser-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("sample.yaml");
        sample.save(&path, SerializationFormat::Yaml).unwrap();
        let back = Sample::open(&path, SerializationFormat::Yaml).unwrap();
        assert_eq!(back, sample);
    }
}
