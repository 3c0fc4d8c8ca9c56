// src/domain/tool.rs
use crate::domain::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub command: Option<String>,
    pub url: Option<String>,
    pub created_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NewTool {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub command: Option<String>,
    pub url: Option<String>,
}

impl NewTool {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if self.category.trim().is_empty() {
            return Err(ValidationError::MissingField("category"));
        }
        Ok(())
    }
}
