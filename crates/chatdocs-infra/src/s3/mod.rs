//! S3 object storage.
//!
//! - `region`: the process-wide holder of the region-bound client
//! - `store`: `ObjectStore` implementation on top of `aws-sdk-s3`

pub mod region;
pub mod store;

pub use region::{Bound, RegionBinding};
pub use store::S3ObjectStore;
