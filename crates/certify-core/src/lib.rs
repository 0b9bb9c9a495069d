//! Certify Core — Fundamental types and errors for certificate issuance
//! and verification.

pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{
    AdminPrincipal, Certificate, CertificateDraft, CertificateId, IssueRequest, NewCertificate,
};
