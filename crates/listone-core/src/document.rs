// The consolidated player database and its JSON form.
//
// The document is a JSON object mapping each role to the array of player
// records in that role. Role order is the order roles were first seen.

use crate::aggregate::PlayerRecord;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

// ---------------------------------------------------------------------------
// PlayerDatabase
// ---------------------------------------------------------------------------

/// All players of one role, in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleBucket {
    pub role: String,
    pub players: Vec<PlayerRecord>,
}

/// Role → ordered player records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerDatabase {
    buckets: Vec<RoleBucket>,
}

impl PlayerDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `record` to its role's bucket, creating the bucket on first use.
    pub fn push(&mut self, role: String, record: PlayerRecord) {
        match self.buckets.iter_mut().find(|b| b.role == role) {
            Some(bucket) => bucket.players.push(record),
            None => self.buckets.push(RoleBucket {
                role,
                players: vec![record],
            }),
        }
    }

    pub fn buckets(&self) -> &[RoleBucket] {
        &self.buckets
    }

    pub fn roles(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.role.as_str()).collect()
    }

    pub fn players(&self, role: &str) -> Option<&[PlayerRecord]> {
        self.buckets
            .iter()
            .find(|b| b.role == role)
            .map(|b| b.players.as_slice())
    }

    pub fn player(&self, role: &str, name: &str) -> Option<&PlayerRecord> {
        self.players(role)?.iter().find(|p| p.name == name)
    }

    /// Total number of player records across all roles.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|b| b.players.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    // -- JSON --

    /// Pretty JSON with two-space indentation. Non-ASCII text is written
    /// as-is, not escaped.
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Write the document to `path`, creating parent directories as needed.
    pub fn write_json(&self, path: &Path) -> Result<(), DocumentError> {
        let io_err = |source: std::io::Error| DocumentError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let file = std::fs::File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|e| DocumentError::Json {
            path: path.to_path_buf(),
            source: e,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)
    }

    pub fn read_json(path: &Path) -> Result<Self, DocumentError> {
        let text = std::fs::read_to_string(path).map_err(|e| DocumentError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_json_str(&text).map_err(|e| DocumentError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

// ---------------------------------------------------------------------------
// Serde: a JSON object whose key order is bucket order
// ---------------------------------------------------------------------------

impl Serialize for PlayerDatabase {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.buckets.len()))?;
        for bucket in &self.buckets {
            map.serialize_entry(&bucket.role, &bucket.players)?;
        }
        map.end()
    }
}

struct PlayerDatabaseVisitor;

impl<'de> Visitor<'de> for PlayerDatabaseVisitor {
    type Value = PlayerDatabase;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map from role to a list of player records")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut db = PlayerDatabase::new();
        while let Some((role, players)) = access.next_entry::<String, Vec<PlayerRecord>>()? {
            for player in players {
                db.push(role.clone(), player);
            }
        }
        Ok(db)
    }
}

impl<'de> Deserialize<'de> for PlayerDatabase {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PlayerDatabaseVisitor)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
