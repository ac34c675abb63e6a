use cardflow_protocol::IdentityReason;

/// Compares an already-assigned employee's passport against a freshly
/// extracted one. Returns `None` when the two agree exactly (nothing to
/// report); otherwise returns the tag describing why they differ, or why
/// the comparison could not be made at all.
pub fn diagnose_identity_mismatch(
    assigned_passport_id: Option<&str>,
    extracted_passport_id: Option<&str>,
) -> Option<IdentityReason> {
    let assigned_raw = assigned_passport_id.unwrap_or("").trim();
    let extracted_raw = extracted_passport_id.unwrap_or("").trim();

    if extracted_raw.is_empty() {
        return Some(IdentityReason::NoExtractedId);
    }
    if assigned_raw.is_empty() {
        return Some(IdentityReason::NoAssignedId);
    }

    let assigned_normalized = cardflow_passport::normalize(Some(assigned_raw));
    let extracted_normalized = cardflow_passport::normalize(Some(extracted_raw));

    match (assigned_normalized, extracted_normalized) {
        (Some(a), Some(b)) if a == b => {
            if assigned_raw != extracted_raw {
                Some(IdentityReason::FormatOnlyDiff)
            } else {
                None
            }
        }
        _ => Some(IdentityReason::ValueDiff),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_extracted_id_is_not_a_mismatch() {
        assert_eq!(
            diagnose_identity_mismatch(Some("N123456"), None),
            Some(IdentityReason::NoExtractedId)
        );
    }

    #[test]
    fn no_assigned_id_is_not_a_mismatch() {
        assert_eq!(
            diagnose_identity_mismatch(None, Some("N123456")),
            Some(IdentityReason::NoAssignedId)
        );
    }

    #[test]
    fn format_only_difference_is_not_a_mismatch() {
        assert_eq!(
            diagnose_identity_mismatch(Some("N-12 34 56"), Some("n123456")),
            Some(IdentityReason::FormatOnlyDiff)
        );
    }

    #[test]
    fn exact_raw_match_has_no_reason() {
        assert_eq!(diagnose_identity_mismatch(Some("N123456"), Some("N123456")), None);
    }

    #[test]
    fn differing_normalized_values_are_a_mismatch() {
        let reason = diagnose_identity_mismatch(Some("N123456"), Some("N654321"));
        assert_eq!(reason, Some(IdentityReason::ValueDiff));
        assert!(reason.unwrap().is_mismatch());
    }
}
