//! Built-in node catalog.
//!
//! Each module exposes a `definition()` and a processor; the pair is
//! registered with the engine's registry at startup via
//! [`register_builtins`].

mod compare;
mod delay;
mod filter;
mod http;
mod if_condition;
mod merge;
mod switch;
mod webhook;

pub use delay::DelayProcessor;
pub use filter::FilterProcessor;
pub use http::HttpRequestProcessor;
pub use if_condition::IfConditionProcessor;
pub use merge::MergeProcessor;
pub use switch::SwitchProcessor;
pub use webhook::WebhookTrigger;

use std::sync::Arc;
use weftengine::NodeRegistry;

/// Register the built-in node set with a registry. Called once at
/// process startup.
pub fn register_builtins(registry: &mut NodeRegistry) {
    registry.register(webhook::definition(), Arc::new(WebhookTrigger));
    registry.register(http::definition(), Arc::new(HttpRequestProcessor::new()));
    registry.register(if_condition::definition(), Arc::new(IfConditionProcessor));
    registry.register(switch::definition(), Arc::new(SwitchProcessor));
    registry.register(merge::definition(), Arc::new(MergeProcessor));
    registry.register(filter::definition(), Arc::new(FilterProcessor));
    registry.register(delay::definition(), Arc::new(DelayProcessor));
}
