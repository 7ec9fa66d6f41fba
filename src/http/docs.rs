//! API documentation endpoints.
//!
//! # Endpoints
//! - `GET /swagger/v1/swagger.json`: OpenAPI 3 document, always served
//! - `GET /swagger`: Swagger UI page, registered only in `development`
//!
//! # Design Decisions
//! - The document is built once per process and shared through `AppState`
//! - The UI loads `swagger-ui-dist` from a CDN and reads the document through
//!   a relative URL, so it keeps working behind an API Gateway stage prefix

use axum::{extract::State, response::Html, Json};
use serde_json::{json, Value};

use crate::http::server::{AppState, InstanceInfo};

pub const OPENAPI_PATH: &str = "/swagger/v1/swagger.json";
pub const SWAGGER_UI_PATH: &str = "/swagger";

const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <title>todo-api</title>
  <link rel="stylesheet" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css" />
</head>
<body>
  <div id="swagger-ui"></div>
  <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js" crossorigin></script>
  <script>
    window.onload = () => {
      window.ui = SwaggerUIBundle({ url: "swagger/v1/swagger.json", dom_id: "#swagger-ui" });
    };
  </script>
</body>
</html>
"##;

pub async fn openapi_document_handler(State(state): State<AppState>) -> Json<Value> {
    Json((*state.openapi).clone())
}

pub async fn swagger_ui() -> Html<&'static str> {
    Html(SWAGGER_UI_HTML)
}

/// OpenAPI document describing the todo and welcome routes.
pub fn openapi_document(instance: &InstanceInfo) -> Value {
    let not_found = json!({ "description": "No item with this id" });
    let id_param = json!({
        "name": "id",
        "in": "path",
        "required": true,
        "schema": { "type": "string", "format": "uuid" }
    });
    let item_ref = json!({ "$ref": "#/components/schemas/TodoItem" });

    json!({
        "openapi": "3.0.3",
        "info": {
            "title": instance.service,
            "version": env!("CARGO_PKG_VERSION"),
            "description": format!("Todo REST service ({})", instance.environment),
        },
        "paths": {
            "/todos": {
                "get": {
                    "operationId": "listTodos",
                    "responses": {
                        "200": {
                            "description": "Every stored item",
                            "content": { "application/json": {
                                "schema": { "type": "array", "items": item_ref }
                            } }
                        }
                    }
                },
                "post": {
                    "operationId": "createTodo",
                    "requestBody": {
                        "required": true,
                        "content": { "application/json": { "schema": item_ref } }
                    },
                    "responses": {
                        "201": {
                            "description": "The stored item with its assigned id",
                            "content": { "application/json": { "schema": item_ref } }
                        }
                    }
                }
            },
            "/todos/{id}": {
                "get": {
                    "operationId": "getTodo",
                    "parameters": [id_param],
                    "responses": {
                        "200": {
                            "description": "The item",
                            "content": { "application/json": { "schema": item_ref } }
                        },
                        "404": not_found
                    }
                },
                "delete": {
                    "operationId": "deleteTodo",
                    "parameters": [id_param],
                    "responses": {
                        "200": { "description": "Deleted" },
                        "404": not_found
                    }
                }
            },
            "/welcome": {
                "get": {
                    "operationId": "welcome",
                    "responses": {
                        "200": {
                            "description": "Instance banner",
                            "content": { "text/plain": { "schema": { "type": "string" } } }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "TodoItem": {
                    "type": "object",
                    "properties": {
                        "id": { "type": "string", "format": "uuid", "readOnly": true },
                        "dueDate": { "type": "string", "format": "date-time", "nullable": true },
                        "text": { "type": "string" },
                        "done": { "type": "boolean" }
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::host::HostMode;
    use crate::store::ItemStore;

    #[test]
    fn test_document_lists_every_route() {
        let instance = InstanceInfo::new(&AppConfig::default(), HostMode::Http);
        let doc = openapi_document(&instance);

        assert_eq!(doc["info"]["title"], "todo-api");
        let paths = doc["paths"].as_object().unwrap();
        let mut names: Vec<_> = paths.keys().map(String::as_str).collect();
        names.sort_unstable();
        assert_eq!(names, ["/todos", "/todos/{id}", "/welcome"]);
        assert!(doc["paths"]["/todos/{id}"]["delete"]["responses"]["404"].is_object());
        assert_eq!(
            doc["components"]["schemas"]["TodoItem"]["properties"]["id"]["readOnly"],
            true
        );
    }

    #[tokio::test]
    async fn test_handler_serves_shared_document() {
        let instance = InstanceInfo::new(&AppConfig::default(), HostMode::Http);
        let expected = openapi_document(&instance);
        let state = AppState::new(ItemStore::new(), instance);

        let Json(body) = openapi_document_handler(State(state)).await;
        assert_eq!(body, expected);
    }
}
