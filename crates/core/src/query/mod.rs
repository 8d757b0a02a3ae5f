//! Generic entity query store and the pieces it is assembled from

mod endpoint;
mod mutation;
mod page;
mod store;

pub use endpoint::ListEndpoint;
pub use mutation::Mutation;
pub use page::into_page;
pub use store::{FetchOutcome, QueryStore};
