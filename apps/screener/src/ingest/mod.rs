// Upload ingestion: filename rules, zip unpacking, and document text extraction.

pub mod archive;
pub mod extract;
pub mod files;
