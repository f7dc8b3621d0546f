//! Versioned memorial document templates

use crate::versioned::Scoped;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Kind of memorial document a template renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateCategory {
    /// Order-of-service program
    Program,
    /// Prayer or memorial card
    PrayerCard,
    /// Obituary announcement
    Obituary,
    /// Thank-you / acknowledgement card
    Acknowledgement,
}

/// Presentation settings attached to a template version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSettings {
    /// Body font family
    pub font_family: String,
    /// Accent color as a hex string
    pub accent_color: String,
    /// Whether the rendered document carries a photo block
    pub include_photo: bool,
}

impl Default for TemplateSettings {
    fn default() -> Self {
        Self {
            font_family: "Georgia".to_string(),
            accent_color: "#2f4f4f".to_string(),
            include_photo: true,
        }
    }
}

/// A memorial template payload, versioned through the SCD2 repository
///
/// `funeral_home_id` of `None` marks a system-wide template available to
/// every funeral home.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorialTemplate {
    /// Template display name
    pub name: String,
    /// Document kind this template renders
    pub category: TemplateCategory,
    /// Template body with `{{variable}}` placeholders
    pub content: String,
    /// Presentation settings
    #[serde(default)]
    pub settings: TemplateSettings,
    /// Owning funeral home; `None` for system-wide templates
    pub funeral_home_id: Option<Uuid>,
}

impl Scoped for MemorialTemplate {
    // System-wide templates scope to the nil UUID.
    fn scope(&self) -> Uuid {
        self.funeral_home_id.unwrap_or_else(Uuid::nil)
    }
}

impl MemorialTemplate {
    /// Variables referenced by this template's content
    pub fn variables(&self) -> Vec<String> {
        extract_variables(&self.content)
    }
}

/// Extract placeholder variable names from template content
///
/// Scans for `{{identifier}}` occurrences, excluding block-helper markers
/// (`{{#each items}}`, `{{/each}}`), and returns the names deduplicated
/// and sorted. Used for documentation and validation only; rendering is a
/// collaborator's concern.
///
/// # Examples
///
/// ```rust
/// use fhm_domain::extract_variables;
///
/// let vars = extract_variables("{{name}} {{name}} {{#if x}}{{y}}{{/if}}");
/// assert_eq!(vars, vec!["name".to_string(), "y".to_string()]);
/// ```
pub fn extract_variables(content: &str) -> Vec<String> {
    let mut names = BTreeSet::new();
    let mut rest = content;
    while let Some(start) = rest.find("{{") {
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            break;
        };
        let inner = after[..end].trim();
        if !inner.is_empty() && !inner.starts_with('#') && !inner.starts_with('/') {
            names.insert(inner.to_string());
        }
        rest = &after[end + 2..];
    }
    names.into_iter().collect()
}
