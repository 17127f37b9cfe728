//! Saved patterns
//!
//! [`PatternStore`] is the persistence seam; [`JsonPatternStore`] keeps every
//! saved pattern in a single JSON document, rewritten on each change.

use crate::error::{Result, TrainerError};
use crate::pattern::Pattern;
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedPattern {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub pattern: Pattern,
}

pub trait PatternStore {
    /// Stores `pattern` under `name` and returns the new entry.
    fn save(&mut self, name: &str, pattern: &Pattern) -> Result<SavedPattern>;
    fn load(&self, id: &str) -> Result<SavedPattern>;
    fn delete(&mut self, id: &str) -> Result<()>;
    /// All entries, oldest first.
    fn list(&self) -> Vec<SavedPattern>;
    fn rename(&mut self, id: &str, name: &str) -> Result<SavedPattern>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    patterns: Vec<SavedPattern>,
}

pub struct JsonPatternStore {
    path: PathBuf,
    document: Document,
}

impl JsonPatternStore {
    /// Opens the store at `path`. A missing file is an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let document = if path.exists() {
            let text = fs::read_to_string(&path)?;
            serde_json::from_str(&text)?
        } else {
            debug!("No pattern library at {}, starting empty", path.display());
            Document::default()
        };
        Ok(Self { path, document })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.document
            .patterns
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| TrainerError::PatternNotFound(id.to_string()))
    }

    /// `custom_<millis>`, bumped until unique within this store.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        loop {
            let id = format!("custom_{}", millis);
            if self.document.patterns.iter().all(|p| p.id != id) {
                return id;
            }
            millis += 1;
        }
    }
}

fn clean_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(TrainerError::Storage("pattern name cannot be empty".into()));
    }
    Ok(name.to_string())
}

impl PatternStore for JsonPatternStore {
    fn save(&mut self, name: &str, pattern: &Pattern) -> Result<SavedPattern> {
        let name = clean_name(name)?;
        let now = Utc::now();
        let saved = SavedPattern {
            id: self.next_id(now),
            name,
            created_at: now,
            updated_at: now,
            pattern: pattern.clone(),
        };
        self.document.patterns.push(saved.clone());
        self.persist()?;
        info!("Saved pattern '{}' as {}", saved.name, saved.id);
        Ok(saved)
    }

    fn load(&self, id: &str) -> Result<SavedPattern> {
        let index = self.position(id)?;
        Ok(self.document.patterns[index].clone())
    }

    fn delete(&mut self, id: &str) -> Result<()> {
        let index = self.position(id)?;
        let removed = self.document.patterns.remove(index);
        self.persist()?;
        info!("Deleted pattern '{}' ({})", removed.name, removed.id);
        Ok(())
    }

    fn list(&self) -> Vec<SavedPattern> {
        self.document.patterns.clone()
    }

    fn rename(&mut self, id: &str, name: &str) -> Result<SavedPattern> {
        let name = clean_name(name)?;
        let index = self.position(id)?;
        let entry = &mut self.document.patterns[index];
        entry.name = name;
        entry.updated_at = Utc::now();
        let renamed = entry.clone();
        self.persist()?;
        Ok(renamed)
    }
}
