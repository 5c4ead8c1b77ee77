//! Demo video catalog.
//!
//! The built-in catalog holds the pre-recorded lessons that can be "generated".
//! A JSON file with the same record shape can replace it at startup.

use anyhow::{bail, Context, Result};
use once_cell::sync::Lazy;
use shared::{CatalogEntry, Config, Difficulty};
use std::path::Path;
use tracing::info;

static BUILTIN: Lazy<Catalog> = Lazy::new(|| Catalog {
    entries: vec![organic_chemistry()],
});

const ORGANIC_CHEMISTRY_EXAMPLES: &[&str] = &[
    "What is organic chemistry?",
    "Explain organic chemistry basics",
    "How do chemical reactions work?",
    "What are organic compounds?",
    "Molecular structure in chemistry",
    "Functional groups in organic chemistry",
];

/// Immutable set of demo videos
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from entries, rejecting records that could match anything
    pub fn new(entries: Vec<CatalogEntry>) -> Result<Self> {
        for entry in &entries {
            if entry.topics.iter().any(|t| t.trim().is_empty()) {
                bail!("Catalog entry '{}' has an empty topic", entry.id);
            }
            if entry.keywords.iter().any(|k| k.trim().is_empty()) {
                bail!("Catalog entry '{}' has an empty keyword", entry.id);
            }
        }
        Ok(Self { entries })
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> &'static Catalog {
        &BUILTIN
    }

    /// Load a catalog from a JSON array of entries
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))?;

        let entries: Vec<CatalogEntry> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog file: {}", path.display()))?;

        let catalog = Self::new(entries)
            .with_context(|| format!("Invalid catalog file: {}", path.display()))?;

        info!(
            path = %path.display(),
            entries = catalog.len(),
            "Catalog loaded"
        );

        Ok(catalog)
    }

    /// The catalog named by `[catalog] path`, or the built-in one
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.catalog_path() {
            Some(path) => Self::from_file(path),
            None => Ok(Self::builtin().clone()),
        }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by its identifier
    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }
}

/// Example questions offered to users; each one matches the built-in catalog
pub fn example_queries() -> &'static [&'static str] {
    ORGANIC_CHEMISTRY_EXAMPLES
}

fn organic_chemistry() -> CatalogEntry {
    let keywords = [
        // Core topics
        "organic chemistry", "organic", "chemistry", "carbon", "hydrocarbon",
        "molecules", "compounds", "chemical reactions", "molecular structure",
        "functional groups", "alkanes", "alkenes", "alkynes", "aromatic",
        "benzene", "isomers", "stereochemistry", "polymers", "biomolecules",
        // Chemical processes
        "synthesis", "oxidation", "reduction", "substitution", "addition",
        "elimination", "condensation", "polymerization", "catalysis",
        // Laboratory and applications
        "laboratory", "experiment", "analysis", "spectroscopy", "chromatography",
        "pharmaceutical", "medicine", "drugs", "plastics", "materials",
        // General chemistry
        "chemical", "reaction", "bond", "structure", "formula", "equation",
        // General education
        "learn", "education", "teach", "explain", "understand", "study",
    ];

    CatalogEntry {
        id: "organic-chemistry-video".to_string(),
        title: "Organic Chemistry with Master Maagne".to_string(),
        description: "Comprehensive introduction to organic chemistry concepts, \
                      molecular structures, and chemical reactions"
            .to_string(),
        teacher: "Master Maagne".to_string(),
        topics: vec!["organic chemistry".to_string(), "chemistry".to_string()],
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        duration: 300,
        storage_id: "1hUqYrKiBIAeML3NQMhX9d8OlriATQWVw".to_string(),
        difficulty: Difficulty::Intermediate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 1);

        let entry = catalog.get("organic-chemistry-video").unwrap();
        assert_eq!(entry.teacher, "Master Maagne");
        assert_eq!(entry.duration, 300);
        assert_eq!(entry.difficulty, Difficulty::Intermediate);
        assert!(entry.keywords.iter().all(|k| !k.is_empty()));
    }

    #[test]
    fn test_rejects_empty_keyword() {
        let mut entry = organic_chemistry();
        entry.keywords.push("  ".to_string());

        let err = Catalog::new(vec![entry]).unwrap_err();
        assert!(err.to_string().contains("empty keyword"));
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("catalog.json");

        let mut physics = organic_chemistry();
        physics.id = "physics-video".to_string();
        physics.topics = vec!["physics".to_string()];
        std::fs::write(&path, serde_json::to_string_pretty(&vec![physics])?)?;

        let catalog = Catalog::from_file(&path)?;
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get("physics-video").is_some());
        assert!(catalog.get("organic-chemistry-video").is_none());

        Ok(())
    }

    #[test]
    fn test_from_file_uses_camel_case() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{
                "id": "algebra",
                "title": "Algebra Basics",
                "description": "Variables and equations",
                "teacher": "Raju Master",
                "topics": ["algebra"],
                "keywords": ["equation", "variable"],
                "duration": 120,
                "storageId": "abc123",
                "difficulty": "beginner"
            }]"#,
        )?;

        let catalog = Catalog::from_file(&path)?;
        let entry = catalog.get("algebra").unwrap();
        assert_eq!(entry.storage_id, "abc123");
        assert_eq!(entry.difficulty, Difficulty::Beginner);

        Ok(())
    }

    #[test]
    fn test_from_config() -> Result<()> {
        let mut config = Config::default();
        assert_eq!(&Catalog::from_config(&config)?, Catalog::builtin());

        config.catalog.path = Some("/nonexistent/catalog.json".to_string());
        assert!(Catalog::from_config(&config).is_err());

        Ok(())
    }

    #[test]
    fn test_from_missing_file() {
        assert!(Catalog::from_file("does-not-exist.json").is_err());
    }
}
