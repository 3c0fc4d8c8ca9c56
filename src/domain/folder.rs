// src/domain/folder.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub type FolderId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub name: String,
    pub parent_id: Option<FolderId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Folder {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
