use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Raw row of the `memes` table. Enrichment columns may still be NULL.
#[derive(Debug, Clone, FromRow)]
pub struct MemeRow {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: Option<String>,
    pub schema: Option<String>,
    pub rules: Option<String>,
    pub captions: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// A meme template as the rest of the service sees it: NULL columns are
/// normalized to empty values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemeTemplate {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub description: String,
    pub schema: String,
    pub rules: String,
    /// Prior example captions, oldest first.
    pub captions: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl From<MemeRow> for MemeTemplate {
    fn from(row: MemeRow) -> Self {
        MemeTemplate {
            id: row.id,
            name: row.name,
            url: row.url,
            description: row.description.unwrap_or_default(),
            schema: row.schema.unwrap_or_default(),
            rules: row.rules.unwrap_or_default(),
            captions: row.captions.unwrap_or_default(),
            created_at: row.created_at,
        }
    }
}

impl MemeTemplate {
    /// Human-readable name: catalog names are slugs like `disaster-girl`.
    pub fn display_name(&self) -> String {
        self.name.replace('-', " ")
    }

    /// Rules as individual bullet lines, with the leading `-` stripped and
    /// blank lines dropped.
    pub fn rule_lines(&self) -> Vec<String> {
        self.rules
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| line.strip_prefix('-').unwrap_or(line).trim().to_string())
            .collect()
    }
}
