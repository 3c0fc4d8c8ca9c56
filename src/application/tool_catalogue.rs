// src/application/tool_catalogue.rs
use crate::application::ToolRepository;
use crate::domain::{DomainError, NewTool, Tool};
use std::collections::BTreeMap;
use tracing::info;

pub struct ToolCatalogue<R: ToolRepository> {
    repository: R,
}

impl<R: ToolRepository> ToolCatalogue<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    pub fn list(&mut self, category: Option<&str>) -> Result<Vec<Tool>, DomainError> {
        self.repository.list_tools(category)
    }

    pub fn add(&mut self, tool: &NewTool) -> Result<Tool, DomainError> {
        tool.validate()?;
        let created = self.repository.create_tool(tool)?;
        info!(tool_id = created.id, name = %created.name, "Added tool");
        Ok(created)
    }

    pub fn delete(&mut self, id: i64) -> Result<(), DomainError> {
        self.repository.delete_tool(id)?;
        info!(tool_id = id, "Deleted tool");
        Ok(())
    }
}

/// Groups tools by category, categories in alphabetical order
pub fn group_by_category(tools: &[Tool]) -> BTreeMap<&str, Vec<&Tool>> {
    let mut groups: BTreeMap<&str, Vec<&Tool>> = BTreeMap::new();
    for tool in tools {
        groups.entry(tool.category.as_str()).or_default().push(tool);
    }
    groups
}
