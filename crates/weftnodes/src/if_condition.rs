use crate::compare::compare;
use async_trait::async_trait;
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("if_condition", "If Condition", NodeCategory::Logic)
        .describe("Conditionally route data based on a condition")
        .with_icon("binary")
        .with_input(
            InputSlot::new("value", "Value", "any")
                .required()
                .describe("Value to evaluate"),
        )
        .with_input(
            InputSlot::new("operator", "Operator", "string")
                .required()
                .with_default("equals")
                .describe("Comparison operator"),
        )
        .with_input(
            InputSlot::new("comparison", "Comparison Value", "any")
                .required()
                .describe("Value to compare against"),
        )
        .with_output(OutputSlot::new("true", "True", "any"))
        .with_output(OutputSlot::new("false", "False", "any"))
}

/// Routes the evaluated value onto exactly one of the `true`/`false`
/// handles; the other handle stays absent so it is never propagated.
pub struct IfConditionProcessor;

#[async_trait]
impl NodeProcessor for IfConditionProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let value = ctx.require_input("value")?;
        let comparison = ctx.require_input("comparison")?;
        let operator = inputs
            .get("operator")
            .and_then(|v| v.as_str())
            .unwrap_or("equals");

        let result = compare(operator, value, comparison)?;
        ctx.logger
            .info(format!("If condition evaluated to: {}", result));

        let mut outputs = ValueMap::new();
        let handle = if result { "true" } else { "false" };
        outputs.insert(handle.to_string(), value.clone());
        Ok(outputs)
    }
}
