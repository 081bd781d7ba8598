pub mod enums;
pub mod model;
pub mod resource;


pub use enums::{OwnerType, ResourceState};
pub use model::{ApiKeyResourceModel, ResourceTimeouts};
pub use resource::{ApiKeyResource, LifecyclePhase, LifecycleTimeouts, ReadOutcome};
