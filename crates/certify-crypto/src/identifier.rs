use certify_core::CertificateId;
use uuid::Uuid;

/// Source of fresh certificate identifiers.
pub trait IdentifierGenerator: Send + Sync {
    /// Produce a new identifier. Never fails; an unavailable entropy
    /// source aborts the process.
    fn generate(&self) -> CertificateId;
}

/// Random (version 4) UUIDs: 122 random bits in the canonical
/// hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdentifierGenerator for RandomIdGenerator {
    fn generate(&self) -> CertificateId {
        CertificateId::new(Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_is_uuid_v4() {
        let id = RandomIdGenerator.generate();
        let parsed = Uuid::parse_str(id.as_str()).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
        assert_eq!(id.as_str().len(), 36);
    }

    #[test]
    fn test_generate_unique() {
        let generator = RandomIdGenerator;
        let ids: HashSet<_> = (0..10_000).map(|_| generator.generate()).collect();
        assert_eq!(ids.len(), 10_000);
    }

    #[test]
    fn test_generate_url_safe() {
        let id = RandomIdGenerator.generate();
        assert!(id
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() || c == '-'));
    }
}
