//! Resource store collaborator: the trait the coordinator runs against and an
//! in-memory adaptor used by the binary and the test suites.

mod adaptors;
mod resource_store;

pub use adaptors::*;
pub use resource_store::*;
