//! Postgres-backed persistence for the work-card extraction and
//! reconciliation pipeline.
//!
//! One module per aggregate under `repo`, following the teacher's
//! separation of a pool-owning connection layer (`pool`) from a
//! typed row layer (`models`) from the query layer itself (`repo`).

pub mod error;
pub mod models;
pub mod pool;
pub mod repo;

pub use error::{DbError, Result};
pub use models::{
    Business, Employee, ExtractionJob, Site, UploadAccessRequest, WorkCard, WorkCardDayEntry, WorkCardFile,
};
pub use pool::{create_pool, run_migrations, DbConfig, DbPool};
pub use repo::{ExtractionJobRepo, MatrixRow, PgEmployeeLookup};
