use std::path::{Path, PathBuf};

const INSTRUCTION_MAX_CHARS: usize = 20_000;

pub const PERSONA_FILE: &str = "PERSONA.md";

/// Assembles the fixed system instruction sent with every model request.
pub struct ContextBuilder {
    pub workspace: PathBuf,
    pub instruction: Option<String>,
    pub runtime_context: bool,
}

impl ContextBuilder {
    pub fn new(workspace: impl AsRef<Path>) -> Self {
        Self {
            workspace: workspace.as_ref().to_path_buf(),
            instruction: None,
            runtime_context: false,
        }
    }

    /// Uses `instruction` instead of the workspace's `PERSONA.md`.
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instruction = Some(instruction.into());
        self
    }

    pub fn with_runtime_context(mut self, enabled: bool) -> Self {
        self.runtime_context = enabled;
        self
    }

    pub fn build_system_instruction(&self) -> Option<String> {
        let mut parts = vec![];

        if let Some(persona) = self.load_persona() {
            parts.push(persona);
        }

        if self.runtime_context {
            parts.push(self.get_runtime_context());
        }

        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n\n---\n\n"))
        }
    }

    fn load_persona(&self) -> Option<String> {
        let content = match &self.instruction {
            Some(instruction) => instruction.clone(),
            None => std::fs::read_to_string(self.workspace.join(PERSONA_FILE)).ok()?,
        };

        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }

        if trimmed.chars().count() > INSTRUCTION_MAX_CHARS {
            let truncated: String = trimmed.chars().take(INSTRUCTION_MAX_CHARS).collect();
            tracing::warn!(
                limit = INSTRUCTION_MAX_CHARS,
                "System instruction truncated"
            );
            Some(truncated)
        } else {
            Some(trimmed.to_string())
        }
    }

    fn get_runtime_context(&self) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!("## Runtime Context\n\n### Current Time\n{}", timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_workspace_has_no_instruction() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(ContextBuilder::new(tmp.path()).build_system_instruction(), None);
    }

    #[test]
    fn reads_persona_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PERSONA_FILE), "\nYou are Orbit.\n").unwrap();

        let instruction = ContextBuilder::new(tmp.path()).build_system_instruction();
        assert_eq!(instruction.as_deref(), Some("You are Orbit."));
    }

    #[test]
    fn inline_instruction_wins_over_file() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PERSONA_FILE), "You are Orbit.").unwrap();

        let instruction = ContextBuilder::new(tmp.path())
            .with_instruction("Be brief.")
            .build_system_instruction();
        assert_eq!(instruction.as_deref(), Some("Be brief."));
    }

    #[test]
    fn long_persona_is_truncated() {
        let tmp = TempDir::new().unwrap();
        let instruction = ContextBuilder::new(tmp.path())
            .with_instruction("x".repeat(INSTRUCTION_MAX_CHARS + 10))
            .build_system_instruction()
            .unwrap();
        assert_eq!(instruction.chars().count(), INSTRUCTION_MAX_CHARS);
    }

    #[test]
    fn runtime_context_is_appended() {
        let tmp = TempDir::new().unwrap();
        let instruction = ContextBuilder::new(tmp.path())
            .with_instruction("Be brief.")
            .with_runtime_context(true)
            .build_system_instruction()
            .unwrap();
        assert!(instruction.starts_with("Be brief."));
        assert!(instruction.contains("### Current Time"));
    }
}
