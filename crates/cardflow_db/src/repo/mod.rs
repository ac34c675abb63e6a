//! Repository layer: one module per aggregate, following the teacher's
//! split between pool-bound repos (job claiming) and executor-generic free
//! functions (everything composable into a caller's transaction).

pub mod businesses;
pub mod day_entries;
pub mod employees;
pub mod extraction_jobs;
pub mod matrix;
pub mod sites;
pub mod upload_access_requests;
pub mod work_card_files;
pub mod work_cards;

pub use employees::PgEmployeeLookup;
pub use extraction_jobs::ExtractionJobRepo;
pub use matrix::MatrixRow;
