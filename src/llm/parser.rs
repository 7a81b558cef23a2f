use crate::error::{Error, Result};
use crate::models::TechStack;

/// Parses the model's tech-stack response. The model is asked for bare JSON
/// but routinely wraps it in markdown fences or prose, so the object is
/// located structurally before deserializing.
pub fn parse_tech_stack(response: &str) -> Result<TechStack> {
    let json_str = extract_json(response)?;

    serde_json::from_str(&json_str)
        .map_err(|e| Error::Parse(format!("Failed to parse tech stack response: {}", e)))
}

fn extract_json(text: &str) -> Result<String> {
    // Try to find JSON block in markdown code blocks
    if let Some(start) = text.find("```json") {
        let start = start + 7;
        if let Some(end) = text[start..].find("```") {
            return Ok(text[start..start + end].trim().to_string());
        }
    }

    // Try plain code block
    if let Some(start) = text.find("```") {
        let start = start + 3;
        // Skip any language identifier on the same line
        let start = text[start..]
            .find('\n')
            .map(|i| start + i + 1)
            .unwrap_or(start);
        if let Some(end) = text[start..].find("```") {
            let content = text[start..start + end].trim();
            if content.starts_with('{') {
                return Ok(content.to_string());
            }
        }
    }

    // Try to find raw JSON object
    if let Some(start) = text.find('{') {
        let mut depth = 0;
        let mut end = start;
        let mut in_string = false;
        let mut escape_next = false;

        for (i, c) in text[start..].char_indices() {
            if escape_next {
                escape_next = false;
                continue;
            }

            match c {
                '\\' if in_string => escape_next = true,
                '"' => in_string = !in_string,
                '{' if !in_string => depth += 1,
                '}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        end = start + i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }

        if depth == 0 && end > start {
            return Ok(text[start..end].to_string());
        }
    }

    Err(Error::Parse("No valid JSON found in response".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_json_from_markdown_fence() {
        let input = "Here's the stack:\n```json\n{\"frameworks\": [\"axum\"]}\n```\n";
        let stack = parse_tech_stack(input).unwrap();
        assert_eq!(stack.frameworks, vec!["axum"]);
    }

    #[test]
    fn extracts_raw_json_embedded_in_prose() {
        let input = r#"The stack is {"primary_languages": ["Rust"], "databases": []} as detected."#;
        let stack = parse_tech_stack(input).unwrap();
        assert_eq!(stack.primary_languages, vec!["Rust"]);
        assert!(stack.databases.is_empty());
    }

    #[test]
    fn missing_categories_default_to_empty() {
        let stack = parse_tech_stack(r#"{"frameworks": ["Django"]}"#).unwrap();
        assert!(stack.primary_languages.is_empty());
        assert_eq!(stack.frameworks, vec!["Django"]);
    }

    #[test]
    fn braces_inside_strings_do_not_confuse_extraction() {
        let input = r#"{"frameworks": ["weird{name}"], "testing": []}"#;
        let stack = parse_tech_stack(input).unwrap();
        assert_eq!(stack.frameworks, vec!["weird{name}"]);
    }

    #[test]
    fn plain_prose_is_a_parse_error() {
        let err = parse_tech_stack("I could not determine the stack.").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }
}
