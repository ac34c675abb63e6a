//! Typed UUID identifiers shared across the work-card pipeline.
//!
//! Every entity gets its own newtype so a `SiteId` can never be passed where
//! an `EmployeeId` is expected, while still deriving `sqlx::Type` so the
//! wrapper binds directly to a `uuid` column.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Error returned when parsing a UUID-backed identifier fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct IdParseError {
    message: String,
}

impl IdParseError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

macro_rules! define_uuid_id {
    ($name:ident, $label:expr) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(id: Uuid) -> Self {
                Self(id)
            }

            pub fn parse(value: &str) -> Result<Self, IdParseError> {
                let id = Uuid::parse_str(value)
                    .map_err(|e| IdParseError::new(format!("invalid {}: {}", $label, e)))?;
                Ok(Self(id))
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }
    };
}

define_uuid_id!(BusinessId, "business ID");
define_uuid_id!(SiteId, "site ID");
define_uuid_id!(EmployeeId, "employee ID");
define_uuid_id!(WorkCardId, "work card ID");
define_uuid_id!(WorkCardFileId, "work card file ID");
define_uuid_id!(ExtractionJobId, "extraction job ID");
define_uuid_id!(WorkCardDayEntryId, "work card day entry ID");
define_uuid_id!(UploadAccessRequestId, "upload access request ID");
define_uuid_id!(UserId, "user ID");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_parse() {
        let id = EmployeeId::new();
        let parsed = EmployeeId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(SiteId::parse("not-a-uuid").is_err());
    }

    #[test]
    fn distinct_id_types_do_not_coerce() {
        let site = SiteId::new();
        let employee = EmployeeId::from_uuid(site.as_uuid());
        assert_eq!(site.as_uuid(), employee.as_uuid());
    }
}
