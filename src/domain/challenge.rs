// src/domain/challenge.rs
use crate::domain::ValidationError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const CATEGORIES: &[&str] = &["Web", "Pwn", "Crypto", "Forensics", "Misc"];
pub const DIFFICULTIES: &[&str] = &["Easy", "Medium", "Hard", "Expert"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResource {
    pub filename: String,
    pub original_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChallengeResources {
    #[serde(default)]
    pub files: Vec<FileResource>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub points: i64,
    #[serde(default)]
    pub solved: bool,
    pub correct_flag: Option<String>,
    #[serde(default)]
    pub resources: ChallengeResources,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Challenge {
    /// Edit payload carrying the current values of this challenge
    pub fn to_form(&self) -> ChallengeForm {
        ChallengeForm {
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            difficulty: self.difficulty.clone(),
            correct_flag: self.correct_flag.clone().unwrap_or_default(),
            resources: self.resources.clone(),
        }
    }
}

/// Create/edit payload of the challenge form
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChallengeForm {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub correct_flag: String,
    pub resources: ChallengeResources,
}

impl ChallengeForm {
    /// Checks required fields in form order and returns the trimmed payload
    pub fn validated(&self) -> Result<ChallengeForm, ValidationError> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("category", &self.category),
            ("difficulty", &self.difficulty),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ValidationError::MissingField(*name));
        }

        Ok(ChallengeForm {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            category: self.category.trim().to_string(),
            difficulty: self.difficulty.trim().to_string(),
            correct_flag: self.correct_flag.trim().to_string(),
            resources: self.resources.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagOutcome {
    Correct,
    Incorrect { message: Option<String> },
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlagCheckResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

impl From<FlagCheckResponse> for FlagOutcome {
    fn from(response: FlagCheckResponse) -> Self {
        if response.status == "success" {
            FlagOutcome::Correct
        } else {
            FlagOutcome::Incorrect {
                message: response.message,
            }
        }
    }
}
