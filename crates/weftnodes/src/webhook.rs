use async_trait::async_trait;
use weftcore::{
    NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot, Value,
    ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("webhook", "Webhook", NodeCategory::Triggers)
        .describe("Receives an inbound HTTP request and starts the workflow")
        .with_icon("antenna")
        .with_output(OutputSlot::new("body", "Request Body", "json"))
        .with_output(OutputSlot::new("query", "Query Params", "json"))
        .with_output(OutputSlot::new("headers", "Request Headers", "json"))
        .with_output(OutputSlot::new("method", "HTTP Method", "string"))
        .with_output(OutputSlot::new("params", "URL Parameters", "json"))
}

/// Trigger node: passes the inbound request payload through to its
/// output handles.
pub struct WebhookTrigger;

#[async_trait]
impl NodeProcessor for WebhookTrigger {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let method = inputs
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("GET")
            .to_string();

        ctx.logger.info(format!(
            "Processing inbound request: {} with {} inputs",
            method,
            inputs.len()
        ));

        let mut outputs = ValueMap::new();
        if let Some(body) = inputs.get("body") {
            outputs.insert("body".to_string(), body.clone());
        }
        for key in ["query", "headers", "params"] {
            let value = inputs.get(key).cloned().unwrap_or_else(Value::empty_object);
            outputs.insert(key.to_string(), value);
        }
        outputs.insert("method".to_string(), Value::from(method));
        Ok(outputs)
    }
}
