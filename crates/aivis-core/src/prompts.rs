use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// One query sent verbatim to every configured answer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub id: String,
    pub text: String,
    #[serde(default = "default_locale")]
    pub locale: String,
    /// Free-form labels; a triggered run scoped to a brand selects prompts
    /// tagged with that brand's slug.
    #[serde(default)]
    pub tags: Vec<String>,
}

fn default_locale() -> String {
    "en".to_string()
}

#[derive(Debug, Deserialize)]
pub struct PromptsFile {
    pub prompts: Vec<PromptConfig>,
}

/// Load and validate the prompt batch from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_prompts(path: &Path) -> Result<PromptsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::PromptsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let prompts_file: PromptsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::PromptsFileParse)?;

    validate_prompts(&prompts_file)?;

    Ok(prompts_file)
}

pub(crate) fn validate_prompts(prompts_file: &PromptsFile) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for prompt in &prompts_file.prompts {
        if prompt.id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "prompt id must be non-empty".to_string(),
            ));
        }

        if prompt.text.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "prompt '{}' has empty text",
                prompt.id
            )));
        }

        if !seen_ids.insert(prompt.id.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate prompt id: '{}'",
                prompt.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(id: &str, text: &str) -> PromptConfig {
        PromptConfig {
            id: id.to_string(),
            text: text.to_string(),
            locale: "en".to_string(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn validate_rejects_empty_id() {
        let file = PromptsFile {
            prompts: vec![prompt("", "best crm tools")],
        };
        let err = validate_prompts(&file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_empty_text() {
        let file = PromptsFile {
            prompts: vec![prompt("p1", "   ")],
        };
        let err = validate_prompts(&file).unwrap_err();
        assert!(err.to_string().contains("empty text"));
    }

    #[test]
    fn validate_rejects_duplicate_id() {
        let file = PromptsFile {
            prompts: vec![prompt("p1", "a"), prompt("p1", "b")],
        };
        let err = validate_prompts(&file).unwrap_err();
        assert!(err.to_string().contains("duplicate prompt id"));
    }

    #[test]
    fn prompts_yaml_parses_with_defaults() {
        let yaml = "prompts:\n  - id: p1\n    text: best project tracker\n";
        let parsed: PromptsFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.prompts.len(), 1);
        assert_eq!(parsed.prompts[0].locale, "en");
        assert!(parsed.prompts[0].tags.is_empty());
        assert!(validate_prompts(&parsed).is_ok());
    }
}
