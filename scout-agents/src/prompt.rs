//! Prompt template for the product agent
//!
//! The template and the tools' usage hints live in a TOML file so they can be
//! tuned without recompiling. The default is embedded from `prompts/agent.toml`.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::Tool;

const EMBEDDED_PROMPT: &str = include_str!("../prompts/agent.toml");

/// Placeholders a template must contain for the loop to work
const REQUIRED_PLACEHOLDERS: &[&str] = &["{tools}", "{input}", "{agent_scratchpad}"];

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Failed to read prompt file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid prompt file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Prompt template is missing the {0} placeholder")]
    MissingPlaceholder(&'static str),
}

/// A prompt definition loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub agent: AgentMetadata,
    pub prompt: TemplateConfig,
    pub tools: ToolHints,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AgentMetadata {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateConfig {
    pub template: String,
}

/// Natural-language usage hints, one per tool
///
/// The hints tell the model what input each tool expects and what it returns.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolHints {
    pub locate_product: String,
    pub describe_product: String,
}

impl ToolHints {
    pub fn hint(&self, tool: Tool) -> &str {
        match tool {
            Tool::LocateProduct => &self.locate_product,
            Tool::DescribeProduct => &self.describe_product,
        }
    }
}

/// Values substituted into the template for one model call
#[derive(Debug, Clone, Default)]
pub struct PromptVars<'a> {
    pub input: &'a str,
    pub history: &'a str,
    pub scratchpad: &'a str,
    pub max_steps: usize,
}

impl PromptTemplate {
    /// Load the embedded default prompt
    pub fn load_embedded() -> Result<Self, PromptError> {
        Self::from_toml(EMBEDDED_PROMPT)
    }

    /// Load a prompt from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PromptError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, PromptError> {
        let template: PromptTemplate = toml::from_str(content)?;
        for &placeholder in REQUIRED_PLACEHOLDERS {
            if !template.prompt.template.contains(placeholder) {
                return Err(PromptError::MissingPlaceholder(placeholder));
            }
        }
        Ok(template)
    }

    /// `name: hint` line per tool
    pub fn tool_catalogue(&self) -> String {
        Tool::ALL
            .iter()
            .map(|tool| format!("{}: {}", tool.name(), self.tools.hint(*tool)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Comma-separated tool names
    pub fn tool_names(&self) -> String {
        Tool::ALL
            .iter()
            .map(|tool| tool.name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Fill in the template
    pub fn render(&self, vars: &PromptVars<'_>) -> String {
        let tools = self.tool_catalogue();
        let tool_names = self.tool_names();
        let max_steps = vars.max_steps.to_string();

        fill(
            &self.prompt.template,
            &[
                ("tools", tools.as_str()),
                ("tool_names", tool_names.as_str()),
                ("max_steps", max_steps.as_str()),
                ("history", vars.history),
                ("input", vars.input),
                ("agent_scratchpad", vars.scratchpad),
            ],
        )
    }
}

/// Single-pass `{name}` substitution
///
/// Substituted text is never scanned again, so braces inside a question or an
/// observation come through untouched. Unknown placeholders are left as is.
fn fill(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replaced = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replaced {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
