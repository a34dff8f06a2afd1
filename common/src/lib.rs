pub mod dates;
pub mod export;
pub mod job;
pub mod messages;
pub mod record;

/* --------- Re-exports para los binarios --------- */

pub use dates::canonical_date;
pub use export::records_to_csv;
pub use job::{Job, JobId, JobState};
pub use messages::{
    AckResponse, ExtractRequest, ExtractResponse, JobResponse, JobStartRequest,
    LastResultsResponse, Request, Response,
};
pub use record::{dedup_by_url, normalize_space, sort_by_last_updated, Record, SortOrder};
