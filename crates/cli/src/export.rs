//! Markdown export for conversations.
//!
//! Renders a conversation to a timestamped markdown file under an exports
//! directory, with a metadata header describing the mode and agent that
//! produced it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use medwing_core::message::{Conversation, Role};

/// Writes conversation exports to a directory.
pub struct MarkdownExporter {
    output_dir: PathBuf,
}

impl MarkdownExporter {
    /// Create an exporter rooted at `output_dir`, creating it if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self { output_dir })
    }

    /// Export the full conversation and return the written file path.
    pub fn export_conversation(
        &self,
        conversation: &Conversation,
        mode: &str,
        agent_name: &str,
    ) -> std::io::Result<PathBuf> {
        let slug = conversation
            .messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| sanitize_filename(&m.content))
            .unwrap_or_else(|| "conversation".into());

        let filename = format!("{}_{slug}.md", Utc::now().format("%Y%m%d_%H%M%S"));
        let path = self.output_dir.join(filename);

        std::fs::write(&path, render_markdown(conversation, mode, agent_name))?;
        Ok(path)
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Render a conversation as a markdown document.
fn render_markdown(conversation: &Conversation, mode: &str, agent_name: &str) -> String {
    let mut out = String::new();

    out.push_str("# Conversation Export\n\n");
    out.push_str("---\n\n## Export Metadata\n\n");
    out.push_str(&format!(
        "- **Export Date:** {}\n",
        Utc::now().format("%Y-%m-%d %H:%M:%S")
    ));
    out.push_str(&format!("- **Processing Mode:** {mode}\n"));
    out.push_str(&format!("- **Agent:** {agent_name}\n"));
    out.push_str(&format!(
        "- **Total Messages:** {}\n",
        conversation.messages.len()
    ));
    out.push_str("- **System:** medwing Aeromedical Evidence Review\n\n---\n\n");

    for message in &conversation.messages {
        // Tool plumbing and empty tool-call shells are internal detail,
        // not part of the exported exchange.
        if message.content.is_empty() {
            continue;
        }
        match message.role {
            Role::User => {
                out.push_str("**Question/Request:**\n\n");
                out.push_str(&message.content);
                out.push_str("\n\n");
            }
            Role::Assistant => {
                out.push_str("**Response:**\n\n");
                out.push_str(&message.content);
                out.push_str("\n\n");
            }
            Role::System | Role::Tool => {}
        }
    }

    out
}

/// Sanitize text for use as a filename fragment.
fn sanitize_filename(text: &str) -> String {
    let mut out = String::new();
    for ch in text.chars().take(80) {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    let truncated: String = trimmed.chars().take(50).collect();
    if truncated.is_empty() {
        "export".into()
    } else {
        truncated
    }
}
