use include_dir::{include_dir, Dir};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use tera::{Context, Error as TeraError, Tera};

use crate::errors::AgentError;

/// System prompts shipped with the crate
static PROMPTS: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/prompts");

pub fn load_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    let rendered = tera.render("inline_template", &context)?;
    Ok(rendered)
}

/// Render a template file: an embedded prompt by its bare name, otherwise a file on disk
pub fn load_prompt_file<T: Serialize>(
    template_file: impl Into<PathBuf>,
    context_data: &T,
) -> Result<String, TeraError> {
    let template_path = template_file.into();

    let template_content = match PROMPTS
        .get_file(&template_path)
        .and_then(|file| file.contents_utf8())
    {
        Some(content) => content.to_string(),
        None => fs::read_to_string(&template_path).map_err(|e| {
            TeraError::chain(
                format!("Failed to read template file {}", template_path.display()),
                e,
            )
        })?,
    };
    load_prompt(&template_content, context_data)
}

/// The A2UI message schema every UI-producing prompt embeds
pub fn a2ui_schema() -> Result<String, TeraError> {
    load_prompt_file("a2ui_schema.md", &serde_json::json!({}))
}

/// `load_prompt_file` for agent construction, where a broken template is an internal error
pub fn system_prompt<T: Serialize>(template_file: &str, context_data: &T) -> Result<String, AgentError> {
    load_prompt_file(template_file, context_data)
        .map_err(|e| AgentError::Internal(format!("{}: {:?}", template_file, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{A2UI_JSON_DELIMITER, UI_JSON_DELIMITER};
    use crate::models::tool::Tool;
    use serde_json::json;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::fs;

    #[test]
    fn test_router_prompt_lists_apps() {
        let context = json!({"apps": [
            {"name": "restaurantFinder", "when": "If the user wants food"},
            {"name": "quizGenerator", "when": "If the user wants to learn"}
        ]});
        let prompt = load_prompt_file("router.md", &context).unwrap();
        assert!(prompt.contains("- If the user wants food, call `restaurantFinder`."));
        assert!(prompt.contains("- If the user wants to learn, call `quizGenerator`."));
    }

    #[test]
    fn test_events_prompt_requires_its_context() {
        let result = load_prompt_file("events.md", &json!({"delimiter": A2UI_JSON_DELIMITER}));
        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_embedded_prompt_is_not_shadowed_by_local_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("drive.md"), "stray {{ delimiter }}").unwrap();
        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();

        let result = load_prompt_file("drive.md", &json!({"delimiter": UI_JSON_DELIMITER}));
        std::env::set_current_dir(original_dir).unwrap();

        let prompt = result.unwrap();
        assert_ne!(prompt, "stray ---UI_JSON---");
        assert!(prompt.contains("FILE_SELECTOR"));
    }

    #[test]
    fn test_load_prompt_file_from_disk() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file_path = temp_dir.path().join("test_template.txt");
        fs::write(&file_path, "Hello, {{ name }}!").unwrap();

        let mut context = HashMap::new();
        context.insert("name".to_string(), "Bob".to_string());

        let result = load_prompt_file(file_path, &context).unwrap();
        assert_eq!(result, "Hello, Bob!");

        temp_dir.close().unwrap();
    }

    #[test]
    fn test_load_prompt_file_missing_file() {
        let context: HashMap<String, String> = HashMap::new();
        let result = load_prompt_file("non_existent_template.txt", &context);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_prompt_with_tools() {
        let template = "### Tools\n{% for tool in tools %}\n{{tool.name}}: {{tool.description}}{% endfor %}";
        let tools = vec![
            Tool::new("get_events", "Search for events.", json!({})),
            Tool::new("add_events_to_calendar", "Add events to Google Calendar.", json!({})),
        ];
        let mut context = HashMap::new();
        context.insert("tools".to_string(), tools);

        let result = load_prompt(template, &context).unwrap();
        assert_eq!(
            result,
            "### Tools\n\nget_events: Search for events.\nadd_events_to_calendar: Add events to Google Calendar."
        );
    }

    #[test]
    fn test_drive_prompt_names_delimiter_and_keeps_examples() {
        let prompt = load_prompt_file("drive.md", &json!({"delimiter": UI_JSON_DELIMITER})).unwrap();
        assert!(prompt.contains("Separated by \"---UI_JSON---\""));
        assert!(prompt.contains(r#"{ "type": "FILE_SELECTOR", "data": { "files""#));
    }

    #[test]
    fn test_budget_prompt_embeds_schema() {
        let schema = a2ui_schema().unwrap();
        assert!(schema.contains("beginRendering"));

        let prompt = load_prompt_file(
            "budget.md",
            &json!({"delimiter": A2UI_JSON_DELIMITER, "schema": schema}),
        )
        .unwrap();
        assert!(prompt.contains("`---a2ui_JSON---`"));
        assert!(prompt.contains("\"dataModelUpdate\": { \"type\": \"object\""));
    }

    #[test]
    fn test_every_embedded_prompt_is_a_valid_template() {
        for file in PROMPTS.files() {
            let source = file.contents_utf8().unwrap();
            let mut tera = Tera::default();
            assert!(
                tera.add_raw_template("check", source).is_ok(),
                "{} does not parse",
                file.path().display()
            );
        }
    }
}
