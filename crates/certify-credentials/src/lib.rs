//! Certify Credentials — verification codes, the certificate store
//! contract, and the issuance and verification services.

pub mod code;
pub mod error;
pub mod issuer;
pub mod origin;
pub mod store;
pub mod verifier;

pub use code::{
    artifact_png, decode_artifact, decode_png, CodeOptions, DecodeError, EncodingError,
    VerificationCodeEncoder,
};
pub use error::CredentialError;
pub use issuer::CertificateIssuer;
pub use origin::{certificate_id_from_url, encode_query_component, Origin, OriginError};
pub use store::{CertificateStore, MemoryStore, StoreError};
pub use verifier::{CertificateVerifier, VerificationReport, VerificationResult};
