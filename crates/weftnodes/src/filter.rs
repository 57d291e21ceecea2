use crate::compare::compare;
use async_trait::async_trait;
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    Value, ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("filter", "Filter", NodeCategory::Data)
        .describe("Filter array items based on a condition")
        .with_icon("filter")
        .with_input(
            InputSlot::new("array", "Array", "array")
                .required()
                .describe("Array to filter"),
        )
        .with_input(
            InputSlot::new("key", "Key", "string")
                .describe("Object key to compare, for arrays of objects"),
        )
        .with_input(
            InputSlot::new("operator", "Operator", "string")
                .required()
                .with_default("equals")
                .describe("Comparison operator"),
        )
        .with_input(
            InputSlot::new("value", "Value", "any")
                .required()
                .describe("Value to compare against"),
        )
        .with_output(OutputSlot::new("filtered", "Filtered Array", "array"))
}

pub struct FilterProcessor;

static NULL: Value = Value::Null;

#[async_trait]
impl NodeProcessor for FilterProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let items = ctx
            .require_input("array")?
            .as_array()
            .ok_or_else(|| NodeError::InvalidInputType {
                field: "array".to_string(),
                expected: "array".to_string(),
            })?;
        let value = ctx.require_input("value")?;
        let key = inputs.get("key").and_then(|v| v.as_str());
        let operator = inputs
            .get("operator")
            .and_then(|v| v.as_str())
            .unwrap_or("equals");

        let mut filtered = Vec::new();
        for item in items {
            let item_value = match key {
                Some(key) => item
                    .as_object()
                    .and_then(|map| map.get(key))
                    .unwrap_or(&NULL),
                None => item,
            };
            if compare(operator, item_value, value)? {
                filtered.push(item.clone());
            }
        }

        ctx.logger.info(format!(
            "Filtered array from {} to {} items",
            items.len(),
            filtered.len()
        ));

        let mut outputs = ValueMap::new();
        outputs.insert("filtered".to_string(), Value::Array(filtered));
        Ok(outputs)
    }
}
