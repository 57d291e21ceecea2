use async_trait::async_trait;
use tokio::time::{sleep, Duration};
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("delay", "Delay", NodeCategory::Utility)
        .describe("Add a delay to workflow execution")
        .with_icon("clock")
        .with_input(
            InputSlot::new("value", "Input Value", "any")
                .required()
                .describe("Value to pass through after the delay"),
        )
        .with_input(
            InputSlot::new("delay", "Delay (ms)", "number")
                .required()
                .with_default(1000i64)
                .describe("Delay duration in milliseconds"),
        )
        .with_output(OutputSlot::new("value", "Output Value", "any"))
}

/// Passes its value through after sleeping.
pub struct DelayProcessor;

#[async_trait]
impl NodeProcessor for DelayProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let value = ctx.require_input("value")?.clone();
        let delay_ms = inputs
            .get("delay")
            .and_then(|v| v.as_f64())
            .unwrap_or(1000.0) as u64;

        ctx.logger
            .info(format!("Delaying execution for {}ms", delay_ms));
        sleep(Duration::from_millis(delay_ms)).await;

        let mut outputs = ValueMap::new();
        outputs.insert("value".to_string(), value);
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use weftcore::{RunLog, Value};

    #[tokio::test]
    async fn passes_value_through_after_delay() {
        let mut inputs = ValueMap::new();
        inputs.insert("value".to_string(), Value::from("payload"));
        inputs.insert("delay".to_string(), Value::from(5.0));
        let ctx = NodeContext::new(
            "delay-1",
            Uuid::new_v4(),
            Uuid::new_v4(),
            inputs.clone(),
            RunLog::new(),
        );

        let outputs = DelayProcessor.process(&inputs, &ctx).await.unwrap();
        assert_eq!(outputs["value"], Value::from("payload"));
    }
}
