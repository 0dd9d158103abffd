mod mem_resource_store;

pub use mem_resource_store::*;
