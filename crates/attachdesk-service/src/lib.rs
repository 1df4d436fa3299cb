mod http;
#[cfg(any(test, feature = "test-helpers"))]
mod memory;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
mod traits;

pub use http::{HttpService, ATTACHMENTS_PATH};
#[cfg(any(test, feature = "test-helpers"))]
pub use memory::{MemoryService, RecordedCall};
pub use traits::{AttachmentService, ServiceError};
