use include_dir::{include_dir, Dir};
use itertools::Itertools;
use serde::Deserialize;
use serde_json::from_str;
use thiserror::Error;

static CONTENT_DIR: Dir = include_dir!("src/content");

const CATALOG_FILE: &str = "catalog.json";

/// A single renderable piece of lesson content.
#[derive(Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Heading { text: String },
    Paragraph { text: String },
    Bullets { items: Vec<String> },
    /// External activity opened in the system browser.
    Link { label: String, url: String },
    /// Embedded external game; in a terminal this degrades to an openable link.
    Embed { title: String, url: String },
    /// Placeholder for the interactive keyboard coloring diagram.
    KeyboardMap,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub blocks: Vec<Block>,
}

impl Lesson {
    /// All external (label, url) pairs in content order.
    pub fn links(&self) -> Vec<(&str, &str)> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Link { label, url } => Some((label.as_str(), url.as_str())),
                Block::Embed { title, url } => Some((title.as_str(), url.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn has_keyboard_map(&self) -> bool {
        self.blocks.iter().any(|b| matches!(b, Block::KeyboardMap))
    }
}

/// A course unit holding an ordered list of lessons.
#[derive(Deserialize, Clone, Debug)]
pub struct Sprint {
    pub id: String,
    pub title: String,
    pub description: String,
    pub lessons: Vec<Lesson>,
}

impl Sprint {
    pub fn lesson(&self, id: &str) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn lesson_index(&self, id: &str) -> Option<usize> {
        self.lessons.iter().position(|l| l.id == id)
    }
}

/// The full static sprint/lesson hierarchy. Fixed at startup, never mutated.
#[derive(Deserialize, Clone, Debug)]
pub struct Catalog {
    pub sprints: Vec<Sprint>,
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("embedded catalog file not found")]
    FileMissing,
    #[error("embedded catalog file is not valid utf-8")]
    Encoding,
    #[error("unable to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate id in catalog: {0}")]
    DuplicateId(String),
}

impl Catalog {
    /// Load and validate the embedded course catalog.
    pub fn load() -> Result<Self, CatalogError> {
        let file = CONTENT_DIR
            .get_file(CATALOG_FILE)
            .ok_or(CatalogError::FileMissing)?;
        let text = file.contents_utf8().ok_or(CatalogError::Encoding)?;
        let catalog: Catalog = from_str(text)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Sprint ids are globally unique; lesson ids are unique within their sprint.
    fn validate(&self) -> Result<(), CatalogError> {
        if let Some(id) = self.sprints.iter().map(|s| &s.id).duplicates().next() {
            return Err(CatalogError::DuplicateId(id.clone()));
        }
        for sprint in &self.sprints {
            if let Some(id) = sprint.lessons.iter().map(|l| &l.id).duplicates().next() {
                return Err(CatalogError::DuplicateId(id.clone()));
            }
        }
        Ok(())
    }

    pub fn sprint(&self, id: &str) -> Option<&Sprint> {
        self.sprints.iter().find(|s| s.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_loads() {
        let catalog = Catalog::load().unwrap();

        assert_eq!(catalog.sprints.len(), 3);
        assert_eq!(catalog.sprints[0].id, "sprint1");
        assert_eq!(catalog.sprints[0].lessons.len(), 4);
    }

    #[test]
    fn placeholder_sprints_have_no_lessons() {
        let catalog = Catalog::load().unwrap();

        assert!(catalog.sprint("sprint2").unwrap().lessons.is_empty());
        assert!(catalog.sprint("sprint3").unwrap().lessons.is_empty());
    }

    #[test]
    fn sprint_lookup_by_id() {
        let catalog = Catalog::load().unwrap();

        assert!(catalog.sprint("sprint1").is_some());
        assert!(catalog.sprint("sprint99").is_none());
    }

    #[test]
    fn lesson_lookup_and_ordering() {
        let catalog = Catalog::load().unwrap();
        let sprint = catalog.sprint("sprint1").unwrap();

        assert_eq!(sprint.lesson_index("l1-1"), Some(0));
        assert_eq!(sprint.lesson_index("l1-4"), Some(3));
        assert!(sprint.lesson("l1-2").is_some());
        assert!(sprint.lesson("l9-9").is_none());
    }

    #[test]
    fn keyboarding_lesson_carries_the_diagram() {
        let catalog = Catalog::load().unwrap();
        let sprint = catalog.sprint("sprint1").unwrap();

        assert!(sprint.lesson("l1-2").unwrap().has_keyboard_map());
        assert!(!sprint.lesson("l1-1").unwrap().has_keyboard_map());
    }

    #[test]
    fn lesson_links_include_embeds() {
        let catalog = Catalog::load().unwrap();
        let sprint = catalog.sprint("sprint1").unwrap();

        let links = sprint.lesson("l1-4").unwrap().links();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].0, "Google Interland Game");

        let links = sprint.lesson("l1-2").unwrap().links();
        assert_eq!(links.len(), 2);
    }

    #[test]
    fn block_deserialization() {
        let json = r#"
        [
            {"type": "heading", "text": "Hello"},
            {"type": "bullets", "items": ["a", "b"]},
            {"type": "keyboard_map"}
        ]
        "#;

        let blocks: Vec<Block> = from_str(json).unwrap();

        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks[0],
            Block::Heading {
                text: "Hello".into()
            }
        );
        assert!(matches!(blocks[2], Block::KeyboardMap));
    }

    #[test]
    fn duplicate_sprint_ids_rejected() {
        let catalog: Catalog = from_str(
            r#"{"sprints": [
                {"id": "s1", "title": "a", "description": "", "lessons": []},
                {"id": "s1", "title": "b", "description": "", "lessons": []}
            ]}"#,
        )
        .unwrap();

        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::DuplicateId(id)) if id == "s1"
        ));
    }

    #[test]
    fn duplicate_lesson_ids_rejected() {
        let catalog: Catalog = from_str(
            r#"{"sprints": [
                {"id": "s1", "title": "a", "description": "", "lessons": [
                    {"id": "l1", "title": "x", "blocks": []},
                    {"id": "l1", "title": "y", "blocks": []}
                ]}
            ]}"#,
        )
        .unwrap();

        assert!(catalog.validate().is_err());
    }
}
