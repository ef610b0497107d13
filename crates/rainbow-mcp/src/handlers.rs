//! Request handlers for MCP methods.
//!
//! One [`Handlers`] instance wraps the shared query service and dispatches
//! JSON-RPC requests. Tool input validation happens here, before the query
//! service is touched: a malformed argument produces a structured
//! `{status:"error", error, tool}` result with `isError`, while a healable
//! miss (NotFound) is a normal tool result carrying the heal envelope.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use rainbow_core::{ClientLabelSet, LabelHash};
use rainbow_service::QueryService;

use crate::protocol::{error_codes, methods, JsonRpcId, JsonRpcRequest, JsonRpcResponse};
use crate::tools::{definitions, tool_names};

/// MCP protocol version this server speaks.
const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct Handlers {
    query: Arc<QueryService>,
}

impl Handlers {
    pub fn new(query: Arc<QueryService>) -> Self {
        Self { query }
    }

    /// Dispatch one request. Returns `None` for notifications, which must
    /// not be answered.
    pub fn handle(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.id.clone();
        debug!(method = %request.method, "mcp request");

        match request.method.as_str() {
            methods::INITIALIZE => Some(self.handle_initialize(id)),
            methods::PING => Some(JsonRpcResponse::success(id, json!({}))),
            methods::TOOLS_LIST => Some(self.handle_tools_list(id)),
            methods::TOOLS_CALL => Some(self.handle_tools_call(id, request.params)),
            _ if id.is_none() => None,
            other => Some(JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {other}"),
            )),
        }
    }

    fn handle_initialize(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "serverInfo": {
                    "name": "rainbow-mcp",
                    "version": env!("CARGO_PKG_VERSION"),
                },
                "capabilities": {
                    "tools": {}
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Option<JsonRpcId>) -> JsonRpcResponse {
        match serde_json::to_value(definitions()) {
            Ok(tools) => JsonRpcResponse::success(id, json!({ "tools": tools })),
            Err(e) => JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("failed to serialize tool definitions: {e}"),
            ),
        }
    }

    fn handle_tools_call(
        &self,
        id: Option<JsonRpcId>,
        params: Option<serde_json::Value>,
    ) -> JsonRpcResponse {
        let params = params.unwrap_or_else(|| json!({}));
        let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
            return JsonRpcResponse::error(
                id,
                error_codes::INVALID_PARAMS,
                "tools/call requires a 'name' parameter",
            );
        };
        let args = params.get("arguments").cloned().unwrap_or_else(|| json!({}));

        match name {
            tool_names::HEAL => self.call_heal(id, &args),
            tool_names::COUNT => {
                let response = self.query.label_count();
                tool_result(id, &response)
            }
            tool_names::VERSION => match self.query.version() {
                Ok(response) => tool_result(id, &response),
                Err(e) => tool_error(id, tool_names::VERSION, e.to_string()),
            },
            other => tool_error(id, other, format!("Unknown tool: {other}")),
        }
    }

    fn call_heal(&self, id: Option<JsonRpcId>, args: &serde_json::Value) -> JsonRpcResponse {
        let Some(labelhash) = args.get("labelhash").and_then(|v| v.as_str()) else {
            return tool_error(id, tool_names::HEAL, "labelhash is required".to_string());
        };
        let label_set_id = args.get("labelSetId").and_then(|v| v.as_str());
        let label_set_version = args.get("labelSetVersion").and_then(|v| v.as_str());

        // Malformed arguments are tool errors; a miss is a normal result.
        let hash = match LabelHash::from_hex(labelhash) {
            Ok(hash) => hash,
            Err(e) => return tool_error(id, tool_names::HEAL, e.to_string()),
        };
        let constraint = match ClientLabelSet::from_wire(label_set_id, label_set_version) {
            Ok(constraint) => constraint,
            Err(e) => return tool_error(id, tool_names::HEAL, e.to_string()),
        };

        let response = self.query.heal_parsed(&hash, &constraint);
        tool_result(id, &response)
    }
}

/// Wrap a serializable payload as MCP text content.
fn tool_result<T: serde::Serialize>(id: Option<JsonRpcId>, payload: &T) -> JsonRpcResponse {
    let text = match serde_json::to_string_pretty(payload) {
        Ok(text) => text,
        Err(e) => {
            return JsonRpcResponse::error(
                id,
                error_codes::INTERNAL_ERROR,
                format!("failed to serialize tool result: {e}"),
            )
        }
    };
    JsonRpcResponse::success(
        id,
        json!({
            "content": [{ "type": "text", "text": text }]
        }),
    )
}

/// Structured tool failure: `{status:"error", error, tool}` with `isError`.
fn tool_error(id: Option<JsonRpcId>, tool: &str, error: String) -> JsonRpcResponse {
    let body = json!({
        "status": "error",
        "error": error,
        "tool": tool,
    });
    JsonRpcResponse::success(
        id,
        json!({
            "content": [{ "type": "text", "text": body.to_string() }],
            "isError": true
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rainbow_core::{LabelSetId, StorageConfig};
    use rainbow_storage::{ingest_label_set, RainbowDb};
    use tempfile::TempDir;

    fn handlers(tmp: &TempDir) -> Handlers {
        let config = StorageConfig {
            data_dir: String::new(),
            block_cache_mb: 8,
            max_open_files: 128,
        };
        {
            let db = RainbowDb::open(tmp.path(), &config).expect("open failed");
            ingest_label_set(
                &db,
                &LabelSetId::new("demo").unwrap(),
                1,
                vec![(LabelHash::from_label("vitalik"), "vitalik".to_string())],
            )
            .expect("ingest failed");
        }
        let db = RainbowDb::open_for_queries(tmp.path(), &config).expect("serve open failed");
        Handlers::new(Arc::new(QueryService::new(Arc::new(db))))
    }

    fn request(method: &str, params: serde_json::Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(JsonRpcId::Number(1)),
            method: method.to_string(),
            params: Some(params),
        }
    }

    fn call_tool(handlers: &Handlers, name: &str, args: serde_json::Value) -> serde_json::Value {
        let response = handlers
            .handle(request(
                methods::TOOLS_CALL,
                json!({"name": name, "arguments": args}),
            ))
            .expect("tool call must be answered");
        response.result.expect("tool call returns a result")
    }

    /// Parse the text content of a tool result back into JSON.
    fn content_json(result: &serde_json::Value) -> serde_json::Value {
        let text = result["content"][0]["text"].as_str().expect("text content");
        serde_json::from_str(text).expect("content is JSON")
    }

    #[test]
    fn initialize_advertises_tools_capability() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let response = handlers
            .handle(request(methods::INITIALIZE, json!({})))
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(result["serverInfo"]["name"], "rainbow-mcp");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn tools_list_returns_all_three() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let response = handlers
            .handle(request(methods::TOOLS_LIST, json!({})))
            .unwrap();
        let tools = &response.result.unwrap()["tools"];
        assert_eq!(tools.as_array().unwrap().len(), 3);
        assert_eq!(tools[0]["name"], "heal");
        assert!(tools[0]["inputSchema"]["properties"]["labelhash"].is_object());
    }

    #[test]
    fn heal_tool_returns_success_envelope() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let hash = LabelHash::from_label("vitalik").to_hex();

        let result = call_tool(&handlers, "heal", json!({"labelhash": hash}));
        assert!(result.get("isError").is_none());
        let body = content_json(&result);
        assert_eq!(body["status"], "success");
        assert_eq!(body["label"], "vitalik");
        assert_eq!(body["errorCode"], 200);
    }

    #[test]
    fn heal_tool_honors_label_set_constraint() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let hash = LabelHash::from_label("vitalik").to_hex();

        let satisfied = content_json(&call_tool(
            &handlers,
            "heal",
            json!({"labelhash": hash, "labelSetId": "demo", "labelSetVersion": "1"}),
        ));
        assert_eq!(satisfied["status"], "success");

        let predates = content_json(&call_tool(
            &handlers,
            "heal",
            json!({"labelhash": hash, "labelSetId": "demo", "labelSetVersion": "0"}),
        ));
        assert_eq!(predates["status"], "error");
        assert_eq!(predates["errorCode"], 404);
    }

    #[test]
    fn heal_tool_rejects_malformed_labelhash() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);

        let result = call_tool(&handlers, "heal", json!({"labelhash": "not-a-hash"}));
        assert_eq!(result["isError"], true);
        let body = content_json(&result);
        assert_eq!(body["status"], "error");
        assert_eq!(body["tool"], "heal");
    }

    #[test]
    fn heal_tool_requires_labelhash_argument() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);

        let result = call_tool(&handlers, "heal", json!({}));
        assert_eq!(result["isError"], true);
        let body = content_json(&result);
        assert!(body["error"].as_str().unwrap().contains("labelhash"));
    }

    #[test]
    fn count_tool_reports_label_count() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);

        let body = content_json(&call_tool(&handlers, "count", json!({})));
        assert_eq!(body["status"], "success");
        assert_eq!(body["count"], 1);
    }

    #[test]
    fn version_tool_reports_schema_and_label_set() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);

        let body = content_json(&call_tool(&handlers, "version", json!({})));
        assert_eq!(body["status"], "success");
        assert_eq!(
            body["versionInfo"]["labelSet"][0]["labelSetId"],
            "demo"
        );
    }

    #[test]
    fn unknown_tool_is_a_structured_error() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);

        let result = call_tool(&handlers, "no-such-tool", json!({}));
        assert_eq!(result["isError"], true);
        let body = content_json(&result);
        assert_eq!(body["tool"], "no-such-tool");
    }

    #[test]
    fn unknown_method_is_method_not_found() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let response = handlers
            .handle(request("no/such-method", json!({})))
            .unwrap();
        assert_eq!(
            response.error.unwrap().code,
            error_codes::METHOD_NOT_FOUND
        );
    }

    #[test]
    fn notifications_are_not_answered() {
        let tmp = TempDir::new().unwrap();
        let handlers = handlers(&tmp);
        let notification = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(handlers.handle(notification).is_none());
    }
}
