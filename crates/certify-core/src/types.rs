use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Opaque certificate identifier.
///
/// Identifiers are compared byte-for-byte; no normalization is applied
/// on lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CertificateId(String);

impl CertificateId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key bytes used by the storage layer.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for CertificateId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for CertificateId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An issued certificate. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Unique identifier, also embedded in the verification URL.
    pub id: CertificateId,
    /// Name of the person the certificate was issued to.
    pub recipient_name: String,
    /// Name of the completed course.
    pub course_name: String,
    /// Calendar date of issue (serialized as `YYYY-MM-DD`).
    pub issue_date: NaiveDate,
    /// PNG data URI of the QR code encoding the verification URL.
    pub verification_artifact: String,
    /// When the store accepted the record.
    pub created_at: DateTime<Utc>,
}

/// A fully prepared certificate that has not been stored yet.
///
/// Only the store turns a draft into a [`Certificate`], because only the
/// store assigns `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateDraft {
    pub id: CertificateId,
    pub recipient_name: String,
    pub course_name: String,
    pub issue_date: NaiveDate,
    pub verification_artifact: String,
}

impl CertificateDraft {
    /// Stamp the draft with its creation time.
    pub fn into_certificate(self, created_at: DateTime<Utc>) -> Certificate {
        Certificate {
            id: self.id,
            recipient_name: self.recipient_name,
            course_name: self.course_name,
            issue_date: self.issue_date,
            verification_artifact: self.verification_artifact,
            created_at,
        }
    }
}

/// Raw issuance input as received from a client.
///
/// Every field is optional at this level so that a missing field is
/// reported as a validation failure rather than a decoding failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    #[serde(default)]
    pub recipient_name: Option<String>,
    #[serde(default)]
    pub course_name: Option<String>,
    #[serde(default)]
    pub issue_date: Option<String>,
}

impl IssueRequest {
    /// Convenience constructor used by clients and tests.
    pub fn new(
        recipient_name: impl Into<String>,
        course_name: impl Into<String>,
        issue_date: Option<String>,
    ) -> Self {
        Self {
            recipient_name: Some(recipient_name.into()),
            course_name: Some(course_name.into()),
            issue_date,
        }
    }

    /// Validate the request and convert it into a [`NewCertificate`].
    ///
    /// Names are trimmed and must be non-empty. An empty `issueDate` is
    /// treated the same as an absent one.
    pub fn validate(self) -> Result<NewCertificate, CoreError> {
        let recipient_name = required_name("recipientName", self.recipient_name)?;
        let course_name = required_name("courseName", self.course_name)?;

        let issue_date = match self.issue_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                    .map_err(|_| CoreError::InvalidDate(raw.to_string()))?,
            ),
        };

        Ok(NewCertificate {
            recipient_name,
            course_name,
            issue_date,
        })
    }
}

fn required_name(field: &str, value: Option<String>) -> Result<String, CoreError> {
    let value = value.unwrap_or_default();
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::MissingField(field.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Validated issuance input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCertificate {
    pub recipient_name: String,
    pub course_name: String,
    /// `None` means "use today's date".
    pub issue_date: Option<NaiveDate>,
}

/// The single administrative credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminPrincipal {
    /// Unique login name.
    pub username: String,
    /// Argon2id PHC string.
    pub password_hash: String,
}
