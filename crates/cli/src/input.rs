//! Prompt and history file loading.

use std::path::Path;

use anyhow::Context;
use chat::Message;

/// Reads prompts from `path`. See [`parse_prompts`].
pub fn read_prompts(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading prompts from {}", path.display()))?;
    parse_prompts(&text).with_context(|| format!("parsing prompts in {}", path.display()))
}

/// A JSON array of strings, or otherwise one prompt per non-blank line.
pub fn parse_prompts(text: &str) -> anyhow::Result<Vec<String>> {
    if text.trim_start().starts_with('[') {
        return Ok(serde_json::from_str(text)?);
    }
    Ok(text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

/// Reads a JSON array of `{"role": ..., "content": ...}` turns.
pub fn read_history(path: &Path) -> anyhow::Result<Vec<Message>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading history from {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing history in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use chat::Role;

    use super::*;

    #[test]
    fn json_array_of_prompts() {
        let prompts = parse_prompts(r#"["one", "two\nlines"]"#).unwrap();
        assert_eq!(prompts, vec!["one", "two\nlines"]);
    }

    #[test]
    fn line_per_prompt_skips_blank_lines() {
        let prompts = parse_prompts("first\n\n  \nsecond\n").unwrap();
        assert_eq!(prompts, vec!["first", "second"]);
    }

    #[test]
    fn malformed_json_array_is_an_error() {
        assert!(parse_prompts("[1, 2]").is_err());
    }

    #[test]
    fn history_roles_deserialise() {
        let history: Vec<Message> = serde_json::from_str(
            r#"[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]"#,
        )
        .unwrap();
        assert_eq!(history[1].role, Role::Assistant);
    }
}
