mod dynamo;
mod memory;
mod traits;

pub use dynamo::{to_attribute, to_item, DynamoEventStore};
pub use memory::InMemoryEventStore;
pub use traits::*;
