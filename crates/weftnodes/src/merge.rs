use async_trait::async_trait;
use weftcore::{
    InputSlot, NodeCategory, NodeContext, NodeDefinition, NodeError, NodeProcessor, OutputSlot,
    Value, ValueMap,
};

pub fn definition() -> NodeDefinition {
    NodeDefinition::new("merge", "Merge", NodeCategory::Data)
        .describe("Merge two inputs into a single output")
        .with_icon("git-merge")
        .with_input(
            InputSlot::new("input1", "Input 1", "any")
                .required()
                .describe("First input to merge"),
        )
        .with_input(
            InputSlot::new("input2", "Input 2", "any")
                .required()
                .describe("Second input to merge"),
        )
        .with_input(
            InputSlot::new("strategy", "Merge Strategy", "string")
                .required()
                .with_default("array")
                .describe("How to merge inputs (array, object, concat)"),
        )
        .with_output(OutputSlot::new("result", "Result", "any"))
}

pub struct MergeProcessor;

#[async_trait]
impl NodeProcessor for MergeProcessor {
    async fn process(&self, inputs: &ValueMap, ctx: &NodeContext) -> Result<ValueMap, NodeError> {
        let input1 = ctx.require_input("input1")?;
        let input2 = ctx.require_input("input2")?;
        let strategy = inputs
            .get("strategy")
            .and_then(|v| v.as_str())
            .unwrap_or("array");

        let result = match strategy {
            "array" => Value::Array(vec![input1.clone(), input2.clone()]),
            "object" => match (input1.as_object(), input2.as_object()) {
                (Some(first), Some(second)) => {
                    let mut merged = first.clone();
                    merged.extend(second.iter().map(|(k, v)| (k.clone(), v.clone())));
                    Value::Object(merged)
                }
                _ => {
                    return Err(NodeError::ExecutionFailed(
                        "Inputs must be objects for object strategy".to_string(),
                    ))
                }
            },
            "concat" => match (input1, input2) {
                (Value::Array(first), Value::Array(second)) => {
                    let mut merged = first.clone();
                    merged.extend(second.iter().cloned());
                    Value::Array(merged)
                }
                (Value::String(first), Value::String(second)) => {
                    Value::String(format!("{}{}", first, second))
                }
                _ => {
                    return Err(NodeError::ExecutionFailed(
                        "Inputs must be arrays or strings for concat strategy".to_string(),
                    ))
                }
            },
            other => {
                return Err(NodeError::Configuration(format!(
                    "Unknown merge strategy: {}",
                    other
                )))
            }
        };

        ctx.logger
            .info(format!("Merged inputs using strategy: {}", strategy));

        let mut outputs = ValueMap::new();
        outputs.insert("result".to_string(), result);
        Ok(outputs)
    }
}
