//! Resolves an extracted passport/name to at most one employee, and
//! diagnoses identity mismatches against an already-assigned employee.

mod diagnostics;
mod lookup;
mod resolver;

pub use diagnostics::diagnose_identity_mismatch;
pub use lookup::{EmployeeHit, EmployeeLookup};
pub use resolver::{EmployeeResolver, MatchInput, MatchOutcome};
