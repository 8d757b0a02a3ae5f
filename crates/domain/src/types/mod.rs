//! Domain types and models

pub mod query;
pub mod record;
pub mod session;

pub use query::{
    apply_base, query_value, FilterPatch, ListFilters, MutationOutcome, Page, PageParamStyle,
    Pagination, QueryFilters, QueryState,
};
pub use record::{Identifiable, Record, RecordId};
pub use session::{Credentials, LogoutReason, SessionState, SessionStatus, UserProfile};
