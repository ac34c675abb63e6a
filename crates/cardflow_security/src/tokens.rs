//! Two JWT flavors: `AuthToken` for admin bearer auth and `PortalToken` for
//! the scoped, short-lived session a responsible employee gets after
//! passing public-portal verification.

use cardflow_ids::{BusinessId, EmployeeId, SiteId, UploadAccessRequestId, UserId};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

const ADMIN_DEFAULT_TTL_SECONDS: i64 = 86_400;
const PORTAL_DEFAULT_TTL_SECONDS: i64 = 3_600;
const PORTAL_SCOPE: &str = "RESPONSIBLE_EMPLOYEE_UPLOAD";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: UserId,
    /// Not part of the original claim set (`sub`, `exp`, `iat`); added
    /// because there is no persisted user-to-business directory to resolve
    /// a tenant from `sub` alone, so the tenant travels with the token
    /// instead, the same way `PortalClaims` already carries its scope.
    pub business_id: BusinessId,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies bearer tokens for the admin API, carrying the user
/// id (`sub`) and tenant (`business_id`), matching §6's
/// `Authorization: Bearer <jwt>` contract.
pub struct AuthToken {
    secret: String,
    ttl_seconds: i64,
}

impl AuthToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: ADMIN_DEFAULT_TTL_SECONDS,
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn issue(&self, user_id: UserId, business_id: BusinessId) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AdminClaims {
            sub: user_id,
            business_id,
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(AuthError::from)
    }

    pub fn verify(&self, token: &str) -> Result<AdminClaims, AuthError> {
        let data = decode::<AdminClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        Ok(data.claims)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalClaims {
    pub request_id: UploadAccessRequestId,
    pub business_id: BusinessId,
    pub site_id: SiteId,
    pub employee_id: EmployeeId,
    pub processing_month: NaiveDate,
    pub scope: String,
    pub exp: i64,
    pub iat: i64,
}

/// Issues and verifies the scoped session token returned by
/// `POST /api/public/verify-access`, tying an upload session to a single
/// `(business, site, employee, month)` tuple.
pub struct PortalToken {
    secret: String,
    ttl_seconds: i64,
}

impl PortalToken {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl_seconds: PORTAL_DEFAULT_TTL_SECONDS,
        }
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: i64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &self,
        request_id: UploadAccessRequestId,
        business_id: BusinessId,
        site_id: SiteId,
        employee_id: EmployeeId,
        processing_month: NaiveDate,
    ) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = PortalClaims {
            request_id,
            business_id,
            site_id,
            employee_id,
            processing_month,
            scope: PORTAL_SCOPE.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(self.ttl_seconds)).timestamp(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(AuthError::from)
    }

    /// Verifies the token and its scope. A portal token signed for a
    /// different scope (there is only one today, but the check stays
    /// explicit for when a second scope shows up) is rejected.
    pub fn verify(&self, token: &str) -> Result<PortalClaims, AuthError> {
        let data = decode::<PortalClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )?;
        if data.claims.scope != PORTAL_SCOPE {
            return Err(AuthError::WrongScope);
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn admin_token_round_trips() {
        let auth = AuthToken::new("test-secret");
        let user_id = UserId::new();
        let business_id = BusinessId::new();
        let token = auth.issue(user_id, business_id).unwrap();
        let claims = auth.verify(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.business_id, business_id);
    }

    #[test]
    fn admin_token_rejects_wrong_secret() {
        let issuer = AuthToken::new("secret-a");
        let verifier = AuthToken::new("secret-b");
        let token = issuer.issue(UserId::new(), BusinessId::new()).unwrap();
        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn admin_token_expires() {
        let auth = AuthToken::new("test-secret").with_ttl_seconds(-1);
        let token = auth.issue(UserId::new(), BusinessId::new()).unwrap();
        let err = auth.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn portal_token_round_trips_with_claims() {
        let portal = PortalToken::new("portal-secret");
        let request_id = UploadAccessRequestId::new();
        let business_id = BusinessId::new();
        let site_id = SiteId::new();
        let employee_id = EmployeeId::new();
        let month = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap();

        let token = portal
            .issue(request_id, business_id, site_id, employee_id, month)
            .unwrap();
        let claims = portal.verify(&token).unwrap();

        assert_eq!(claims.request_id, request_id);
        assert_eq!(claims.business_id, business_id);
        assert_eq!(claims.site_id, site_id);
        assert_eq!(claims.employee_id, employee_id);
        assert_eq!(claims.processing_month, month);
        assert_eq!(claims.scope, PORTAL_SCOPE);
    }

    #[test]
    fn portal_token_rejects_admin_token() {
        let admin = AuthToken::new("shared-secret");
        let portal = PortalToken::new("shared-secret");
        let admin_token = admin.issue(UserId::new(), BusinessId::new()).unwrap();
        assert!(portal.verify(&admin_token).is_err());
    }
}
