use async_trait::async_trait;
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    Value, ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("http_request", "HTTP Request", NodeCategory::Actions)
        .describe("Make an HTTP request to a URL")
        .with_icon("send")
        .with_input(
            InputSlot::new("method", "Method", "string")
                .required()
                .with_default("GET")
                .describe("HTTP method (GET, POST, PUT, DELETE)"),
        )
        .with_input(
            InputSlot::new("url", "URL", "string")
                .required()
                .describe("URL to request"),
        )
        .with_input(InputSlot::new("headers", "Headers", "json").describe("HTTP headers"))
        .with_input(InputSlot::new("body", "Body", "json").describe("Request body"))
        .with_output(OutputSlot::new("response", "Response", "json"))
        .with_output(OutputSlot::new("status", "Status Code", "number"))
        .with_output(OutputSlot::new("headers", "Response Headers", "json"))
}

/// Performs an HTTP request with the node's inputs.
pub struct HttpRequestProcessor {
    client: reqwest::Client,
}

impl HttpRequestProcessor {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpRequestProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeProcessor for HttpRequestProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let url = ctx.require_str("url")?;
        let method = inputs
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("GET");

        ctx.logger
            .info(format!("Making HTTP {} request to {}", method, url));

        let mut request = match method.to_uppercase().as_str() {
            "GET" => self.client.get(url),
            "POST" => self.client.post(url),
            "PUT" => self.client.put(url),
            "DELETE" => self.client.delete(url),
            other => {
                return Err(NodeError::Configuration(format!(
                    "Unsupported method: {}",
                    other
                )))
            }
        };

        if let Some(Value::Object(headers)) = inputs.get("headers") {
            for (key, value) in headers {
                if let Some(text) = value.as_str() {
                    request = request.header(key, text);
                }
            }
        }

        if method.to_uppercase() != "GET" {
            if let Some(body) = inputs.get("body") {
                let json: serde_json::Value = body.clone().into();
                request = request.json(&json);
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let headers: ValueMap = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    Value::from(v.to_str().unwrap_or_default()),
                )
            })
            .collect();

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|ct| ct.contains("application/json"))
            .unwrap_or(false);

        let body_text = response
            .text()
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("Failed to read response: {}", e)))?;

        let response_data = if is_json {
            serde_json::from_str::<serde_json::Value>(&body_text)
                .map(Value::from)
                .unwrap_or(Value::String(body_text))
        } else {
            Value::String(body_text)
        };

        ctx.logger.info(format!("Response status: {}", status));

        let mut outputs = ValueMap::new();
        outputs.insert("response".to_string(), response_data);
        outputs.insert("status".to_string(), Value::from(status as f64));
        outputs.insert("headers".to_string(), Value::Object(headers));
        Ok(outputs)
    }
}
