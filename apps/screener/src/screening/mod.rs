// Screening pipeline: job parsing, session bookkeeping, background scoring, and reporting.
// All model traffic goes through `scoring`, never directly from here.

pub mod job_details;
pub mod processor;
pub mod report;
pub mod session;
pub mod tracker;
