use async_trait::async_trait;
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("switch", "Switch", NodeCategory::Logic)
        .describe("Route data to different outputs based on a value")
        .with_icon("arrow-right-left")
        .with_input(
            InputSlot::new("value", "Value", "any")
                .required()
                .describe("Value to evaluate"),
        )
        .with_input(
            InputSlot::new("cases", "Cases", "json")
                .required()
                .describe("Mapping from case value to output handle"),
        )
        .with_output(OutputSlot::new("case1", "Case 1", "any"))
        .with_output(OutputSlot::new("case2", "Case 2", "any"))
        .with_output(OutputSlot::new("case3", "Case 3", "any"))
        .with_output(OutputSlot::new("default", "Default", "any"))
}

/// Routes the value onto the output handle named by the first matching
/// case; unmatched values go to `default`.
pub struct SwitchProcessor;

#[async_trait]
impl NodeProcessor for SwitchProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let value = ctx.require_input("value")?;
        let cases = inputs
            .get("cases")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let mut outputs = ValueMap::new();
        for (case_value, output_handle) in &cases {
            let matches_case = value.as_str() == Some(case_value.as_str())
                || (case_value == "null" && value.is_null());
            if matches_case {
                if let Some(handle) = output_handle.as_str() {
                    outputs.insert(handle.to_string(), value.clone());
                    ctx.logger.info(format!(
                        "Switch matched case \"{}\" -> \"{}\"",
                        case_value, handle
                    ));
                    return Ok(outputs);
                }
            }
        }

        outputs.insert("default".to_string(), value.clone());
        ctx.logger.info("Switch used default case");
        Ok(outputs)
    }
}
