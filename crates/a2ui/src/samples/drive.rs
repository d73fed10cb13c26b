use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;

use super::{Handlers, SampleOptions};
use crate::agent::{Agent, AgentConfig};
use crate::errors::AgentResult;
use crate::extract::UI_JSON_DELIMITER;
use crate::models::tool::Tool;
use crate::prompt_template::system_prompt;
use crate::providers::base::Provider;
use crate::stores::drive::Drive;
use crate::stores::{StoreError, Stores};
use crate::toolbox::{required_str, string_list, Toolbox};

pub fn tools() -> Vec<Tool> {
    let file_ids = json!({
        "type": "OBJECT",
        "properties": {
            "fileIds": {
                "type": "ARRAY",
                "items": {"type": "STRING"},
                "description": "Array of file IDs to fetch."
            }
        },
        "required": ["fileIds"]
    });

    vec![
        Tool::new(
            "list_files_in_folder",
            "List files in a specific folder by name. Returns ID and Name.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "folderName": {
                        "type": "STRING",
                        "description": "Name of the folder to search (e.g., 'sample')."
                    }
                },
                "required": ["folderName"]
            }),
        ),
        Tool::new(
            "fetch_file_details",
            "Fetch content for a list of file IDs. Used for viewing content or previewing before edit.",
            file_ids.clone(),
        ),
        Tool::new(
            "fetch_files_metadata",
            "Fetch metadata (id, size, mimeType, created) for a list of file IDs.",
            file_ids,
        ),
        Tool::new(
            "update_file_content",
            "Overwrite the content of a file.",
            json!({
                "type": "OBJECT",
                "properties": {
                    "fileId": {"type": "STRING"},
                    "newContent": {"type": "STRING"}
                },
                "required": ["fileId", "newContent"]
            }),
        ),
    ]
}

pub fn toolbox(drive: Arc<dyn Drive>) -> AgentResult<Toolbox> {
    let (d1, d2, d3, d4) = (drive.clone(), drive.clone(), drive.clone(), drive);
    let handlers = Handlers::default()
        .with("list_files_in_folder", move |args| list_files(&*d1, args))
        .with("fetch_file_details", move |args| Ok(file_details(&*d2, args)))
        .with("fetch_files_metadata", move |args| Ok(files_metadata(&*d3, args)))
        .with("update_file_content", move |args| update_file(&*d4, args));
    Toolbox::new(tools(), handlers.into_inner())
}

/// The drive task agent chains calls: list, then fetch or update in the same turn
pub fn agent(
    provider: Arc<dyn Provider>,
    stores: &Stores,
    options: &SampleOptions,
) -> AgentResult<Agent> {
    let prompt = system_prompt("drive.md", &json!({ "delimiter": UI_JSON_DELIMITER }))?;
    Ok(Agent::new(
        provider,
        toolbox(stores.drive.clone())?,
        prompt,
        AgentConfig::chained(0.1, UI_JSON_DELIMITER, options.max_tool_rounds),
    ))
}

fn list_files(drive: &dyn Drive, args: &Value) -> anyhow::Result<Value> {
    let folder = required_str(args, "folderName")?;

    let mut files = match drive.list_folder(folder) {
        Ok(files) => files,
        Err(StoreError::FolderNotFound(_)) => {
            drive.create_folder(folder)?;
            return Ok(json!({ "error": format!("Folder '{}' not found. I created it.", folder) }));
        }
        Err(e) => return Err(e.into()),
    };

    files.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name))
    });
    Ok(files
        .iter()
        .map(|file| json!({ "id": file.id, "name": file.name }))
        .collect())
}

fn file_details(drive: &dyn Drive, args: &Value) -> Value {
    string_list(args, "fileIds")
        .into_iter()
        .map(|id| match drive.file(&id) {
            Ok(file) => {
                let content = if file.is_textual() {
                    file.content.clone()
                } else {
                    "[Binary Content]".to_string()
                };
                json!({ "id": id, "name": file.name, "content": content })
            }
            Err(_) => json!({ "id": id, "error": "File not found" }),
        })
        .collect()
}

fn files_metadata(drive: &dyn Drive, args: &Value) -> Value {
    string_list(args, "fileIds")
        .into_iter()
        .map(|id| match drive.file(&id) {
            Ok(file) => json!({
                "name": file.name,
                "id": file.id,
                "size": format!("{} bytes", file.size()),
                "created": file.created.to_rfc2822(),
                "type": file.mime_type,
            }),
            Err(_) => json!({ "id": id, "error": "File not found" }),
        })
        .collect()
}

fn update_file(drive: &dyn Drive, args: &Value) -> anyhow::Result<Value> {
    let id = required_str(args, "fileId")?;
    let content = required_str(args, "newContent")?;
    let file = drive.set_content(id, content)?;
    Ok(json!({
        "status": "success",
        "name": file.name,
        "updated": Utc::now().to_rfc2822(),
    }))
}
