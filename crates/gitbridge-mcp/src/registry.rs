//! Tool registry.
//!
//! A single immutable catalog of callable tools. Every discovery path renders
//! from it and every invocation is validated against it.

use std::collections::HashSet;

use gitbridge_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::protocol::{JsonRpcError, ServerCapabilities, ServerInfo, MCP_VERSION};

/// Human-facing name of the gateway in discovery documents.
pub const SERVER_TITLE: &str = "GitHub MCP Server";

/// Description shown in discovery documents.
pub const SERVER_DESCRIPTION: &str =
    "Provides GitHub repository and issue management capabilities";

/// Behavior hints for a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAnnotations {
    pub title: String,
    pub read_only_hint: bool,
    pub open_world_hint: bool,
}

/// MCP tool definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub annotations: ToolAnnotations,
}

impl ToolDescriptor {
    pub fn new(
        name: &str,
        title: &str,
        description: &str,
        read_only: bool,
        input_schema: Value,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
            annotations: ToolAnnotations {
                title: title.to_string(),
                read_only_hint: read_only,
                open_world_hint: true,
            },
        }
    }

    /// Field names listed in the schema's `required` array.
    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.input_schema
            .get("required")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
    }
}

/// Immutable tool catalog.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Build a registry, rejecting duplicate names.
    pub fn new(tools: Vec<ToolDescriptor>) -> Result<Self> {
        let mut seen = HashSet::new();
        for tool in &tools {
            if !seen.insert(tool.name.as_str()) {
                return Err(Error::InvalidData(format!(
                    "duplicate tool name: {}",
                    tool.name
                )));
            }
        }
        Ok(Self { tools })
    }

    /// Registry with the built-in GitHub tools.
    pub fn builtin() -> Self {
        Self {
            tools: builtin_tools(),
        }
    }

    /// Tool descriptors in registration order.
    pub fn list(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Shallow presence check of the required arguments.
    ///
    /// A field is missing when absent or `null`; the first missing one is named.
    pub fn validate(&self, name: &str, args: &Value) -> std::result::Result<(), JsonRpcError> {
        let tool = self
            .get(name)
            .ok_or_else(|| JsonRpcError::method_not_found(name))?;

        for field in tool.required() {
            if args.get(field).map_or(true, Value::is_null) {
                return Err(JsonRpcError::invalid_params(&format!(
                    "missing required argument '{}' for tool '{}'",
                    field, name
                )));
            }
        }

        Ok(())
    }

    /// The single discovery payload shared by every discovery entry point.
    ///
    /// `actions` is the catalog as read by clients that still send
    /// `{action_id, parameters}` bodies.
    pub fn discovery_document(&self, server_info: &ServerInfo) -> Value {
        let functions: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                json!({
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                })
            })
            .collect();

        let actions: Vec<Value> = self
            .tools
            .iter()
            .map(|t| {
                json!({
                    "id": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                })
            })
            .collect();

        json!({
            "name": SERVER_TITLE,
            "description": SERVER_DESCRIPTION,
            "version": server_info.version,
            "protocolVersion": MCP_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": server_info,
            "functions": functions,
            "tools": self.tools,
            "actions": actions,
        })
    }
}

fn owner_repo_properties() -> serde_json::Map<String, Value> {
    let mut props = serde_json::Map::new();
    props.insert(
        "owner".into(),
        json!({"type": "string", "description": "Repository owner"}),
    );
    props.insert(
        "repo".into(),
        json!({"type": "string", "description": "Repository name"}),
    );
    props
}

fn state_listing_schema(state_description: &str) -> Value {
    let mut props = owner_repo_properties();
    props.insert(
        "state".into(),
        json!({
            "type": "string",
            "enum": ["open", "closed", "all"],
            "description": state_description,
            "default": "open"
        }),
    );
    props.insert(
        "per_page".into(),
        json!({
            "type": "integer",
            "description": "Number of results per page",
            "default": 10,
            "minimum": 1,
            "maximum": 100
        }),
    );
    json!({"type": "object", "properties": props, "required": ["owner", "repo"]})
}

fn builtin_tools() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor::new(
            "get_repository",
            "Get Repository",
            "Get information about a specific GitHub repository",
            true,
            json!({
                "type": "object",
                "properties": owner_repo_properties(),
                "required": ["owner", "repo"]
            }),
        ),
        ToolDescriptor::new(
            "search_repositories",
            "Search Repositories",
            "Search for GitHub repositories",
            true,
            json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query for GitHub repositories"
                    },
                    "sort": {
                        "type": "string",
                        "enum": ["stars", "forks", "updated"],
                        "description": "Sort criteria",
                        "default": "stars"
                    },
                    "order": {
                        "type": "string",
                        "enum": ["asc", "desc"],
                        "description": "Sort order",
                        "default": "desc"
                    },
                    "per_page": {
                        "type": "integer",
                        "description": "Number of results per page",
                        "default": 10,
                        "minimum": 1,
                        "maximum": 100
                    }
                },
                "required": ["query"]
            }),
        ),
        ToolDescriptor::new(
            "get_readme",
            "Get README",
            "Get the decoded README of a GitHub repository",
            true,
            json!({
                "type": "object",
                "properties": owner_repo_properties(),
                "required": ["owner", "repo"]
            }),
        ),
        ToolDescriptor::new(
            "list_issues",
            "List Issues",
            "List issues for a repository",
            true,
            state_listing_schema("Issue state"),
        ),
        ToolDescriptor::new(
            "list_pull_requests",
            "List Pull Requests",
            "List pull requests for a repository",
            true,
            state_listing_schema("Pull request state"),
        ),
        ToolDescriptor::new(
            "create_issue",
            "Create Issue",
            "Create a new issue in a repository",
            false,
            json!({
                "type": "object",
                "properties": {
                    "owner": {"type": "string", "description": "Repository owner"},
                    "repo": {"type": "string", "description": "Repository name"},
                    "title": {"type": "string", "description": "Issue title"},
                    "body": {"type": "string", "description": "Issue body content"},
                    "labels": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Labels to add to the issue"
                    }
                },
                "required": ["owner", "repo", "title"]
            }),
        ),
        ToolDescriptor::new(
            "analyze_repository",
            "Analyze Repository",
            "Analyze a GitHub repository and its open issues with an LLM",
            true,
            json!({
                "type": "object",
                "properties": {
                    "owner": {"type": "string", "description": "Repository owner"},
                    "repo": {"type": "string", "description": "Repository name"},
                    "prompt": {
                        "type": "string",
                        "description": "Optional focus for the analysis"
                    }
                },
                "required": ["owner", "repo"]
            }),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> ServerInfo {
        ServerInfo::new("gitbridge", "0.1.0")
    }

    #[test]
    fn test_builtin_registry_order() {
        let registry = ToolRegistry::builtin();
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "get_repository",
                "search_repositories",
                "get_readme",
                "list_issues",
                "list_pull_requests",
                "create_issue",
                "analyze_repository"
            ]
        );
    }

    #[test]
    fn test_builtin_names_are_unique() {
        assert!(ToolRegistry::new(builtin_tools()).is_ok());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut tools = builtin_tools();
        tools.push(tools[0].clone());
        let err = ToolRegistry::new(tools).unwrap_err();
        assert!(err.to_string().contains("get_repository"));
    }

    #[test]
    fn test_get_unknown() {
        assert!(ToolRegistry::builtin().get("delete_repository").is_none());
    }

    #[test]
    fn test_validate_ok() {
        let registry = ToolRegistry::builtin();
        assert!(registry
            .validate("get_repository", &json!({"owner": "o", "repo": "r"}))
            .is_ok());
    }

    #[test]
    fn test_validate_names_first_missing_field() {
        let registry = ToolRegistry::builtin();
        let err = registry
            .validate("create_issue", &json!({"owner": "o"}))
            .unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
        assert!(err.message.contains("'repo'"));
    }

    #[test]
    fn test_validate_null_counts_as_missing() {
        let registry = ToolRegistry::builtin();
        let err = registry
            .validate("get_repository", &json!({"owner": "o", "repo": null}))
            .unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
    }

    #[test]
    fn test_validate_non_object_args() {
        let registry = ToolRegistry::builtin();
        let err = registry.validate("search_repositories", &Value::Null).unwrap_err();
        assert_eq!(err.code, JsonRpcError::INVALID_PARAMS);
    }

    #[test]
    fn test_validate_unknown_tool() {
        let err = ToolRegistry::builtin()
            .validate("nope", &json!({}))
            .unwrap_err();
        assert_eq!(err.code, JsonRpcError::METHOD_NOT_FOUND);
    }

    #[test]
    fn test_discovery_document_lists_every_tool_twice() {
        let registry = ToolRegistry::builtin();
        let doc = registry.discovery_document(&info());

        let functions = doc["functions"].as_array().unwrap();
        let tools = doc["tools"].as_array().unwrap();
        assert_eq!(functions.len(), registry.list().len());
        assert_eq!(tools.len(), registry.list().len());

        assert_eq!(functions[0]["name"], "get_repository");
        assert_eq!(functions[0]["parameters"]["required"], json!(["owner", "repo"]));
        assert_eq!(tools[0]["inputSchema"], functions[0]["parameters"]);
        assert_eq!(tools[0]["annotations"]["readOnlyHint"], true);
        assert_eq!(tools[5]["annotations"]["readOnlyHint"], false);
    }

    #[test]
    fn test_discovery_document_legacy_actions() {
        let registry = ToolRegistry::builtin();
        let doc = registry.discovery_document(&info());

        let ids: Vec<&str> = doc["actions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["id"].as_str().unwrap())
            .collect();
        let names: Vec<&str> = registry.list().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(ids, names);
        assert_eq!(doc["actions"][2]["parameters"], doc["functions"][2]["parameters"]);
    }

    #[test]
    fn test_discovery_document_header() {
        let doc = ToolRegistry::builtin().discovery_document(&info());
        assert_eq!(doc["name"], SERVER_TITLE);
        assert_eq!(doc["version"], "0.1.0");
        assert_eq!(doc["protocolVersion"], MCP_VERSION);
        assert_eq!(doc["serverInfo"]["name"], "gitbridge");
        assert_eq!(doc["capabilities"]["tools"]["listChanged"], false);
    }
}
