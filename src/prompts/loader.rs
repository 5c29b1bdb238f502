use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

use super::templates::{
    EXPRESSION_ENGINE_DEFAULT, FINGERPRINT_DEFAULT, NARRATOR_SYSTEM_DEFAULT, STATE_UPDATE_DEFAULT,
};

/// Loads prompt templates from the filesystem with fallback to the
/// built-in defaults.
pub struct PromptLoader {
    prompts_dir: PathBuf,
}

impl PromptLoader {
    pub fn new(data_path: impl AsRef<Path>) -> Self {
        Self {
            prompts_dir: data_path.as_ref().join("prompts"),
        }
    }

    /// Load a template by name, using the default if no file exists
    fn load_or_default(&self, name: &str, default: &str) -> Result<String> {
        let possible_paths = vec![
            self.prompts_dir.join("core").join(format!("{}.md", name)),
            self.prompts_dir.join(format!("{}.md", name)),
        ];

        for path in possible_paths {
            if path.exists() {
                log::debug!("Loading prompt template from: {:?}", path);
                return fs::read_to_string(&path)
                    .map_err(|e| anyhow::anyhow!("Failed to read prompt '{}': {}", name, e));
            }
        }

        log::debug!("Using default template for '{}'", name);
        Ok(default.to_string())
    }

    pub fn load_narrator_system(&self) -> Result<String> {
        self.load_or_default("narrator_system", NARRATOR_SYSTEM_DEFAULT)
    }

    pub fn load_fingerprint(&self) -> Result<String> {
        self.load_or_default("fingerprint", FINGERPRINT_DEFAULT)
    }

    pub fn load_expression_engine(&self) -> Result<String> {
        self.load_or_default("expression_engine", EXPRESSION_ENGINE_DEFAULT)
    }

    pub fn load_state_update(&self) -> Result<String> {
        self.load_or_default("state_update", STATE_UPDATE_DEFAULT)
    }

    /// Load a custom template with no built-in fallback
    pub fn load_custom(&self, name: &str) -> Result<String> {
        let path = self.prompts_dir.join(format!("{}.md", name));
        fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Failed to read prompt '{}': {}", name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn missing_files_fall_back_to_defaults() {
        let loader = PromptLoader::new("/nonexistent/data/dir");
        let text = loader.load_narrator_system().unwrap();
        assert!(text.contains("narrator"));
    }

    #[test]
    fn files_on_disk_win_over_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prompts = dir.path().join("prompts");
        fs::create_dir_all(&prompts).unwrap();
        let mut file = fs::File::create(prompts.join("fingerprint.md")).unwrap();
        writeln!(file, "custom fingerprint text").unwrap();

        let loader = PromptLoader::new(dir.path());
        let text = loader.load_fingerprint().unwrap();
        assert!(text.contains("custom fingerprint text"));
    }

    #[test]
    fn custom_template_without_fallback_errors_when_missing() {
        let loader = PromptLoader::new("/nonexistent/data/dir");
        assert!(loader.load_custom("does_not_exist").is_err());
    }
}
