//! Deterministic identifiers derived from BLAKE3.

use blake3::Hasher;

/// Computes a 64-bit hash of `data` (first 8 bytes of its BLAKE3 digest, little endian).
///
/// Collisions are negligible at reference-corpus scale (a few thousand chunks); a collision
/// would overwrite one chunk with another on upsert, never corrupt the collection.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    digest_prefix(blake3::hash(data))
}

/// Point id for a reference chunk.
///
/// Stable across runs so re-ingesting the same document overwrites its previous chunks
/// instead of duplicating them.
#[inline]
pub fn reference_point_id(document_type: &str, section: Option<&str>, chunk_index: usize) -> u64 {
    let mut hasher = Hasher::new();
    hasher.update(document_type.as_bytes());
    hasher.update(b"|");
    hasher.update(section.unwrap_or("").as_bytes());
    hasher.update(b"|");
    hasher.update(&(chunk_index as u64).to_le_bytes());
    digest_prefix(hasher.finalize())
}

#[inline]
fn digest_prefix(hash: blake3::Hash) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hash_to_u64_determinism() {
        let data = b"job_description";
        assert_eq!(hash_to_u64(data), hash_to_u64(data));
    }

    #[test]
    fn test_hash_to_u64_uniqueness() {
        let inputs = [
            b"job_description".as_slice(),
            b"case_study_brief".as_slice(),
            b"scoring_rubric".as_slice(),
            b"scoring_rubric ".as_slice(),
        ];

        let hashes: HashSet<_> = inputs.iter().map(|i| hash_to_u64(i)).collect();
        assert_eq!(hashes.len(), inputs.len());
    }

    #[test]
    fn test_reference_point_id_is_stable() {
        let a = reference_point_id("scoring_rubric", Some("cv_evaluation"), 3);
        let b = reference_point_id("scoring_rubric", Some("cv_evaluation"), 3);
        assert_eq!(a, b);
    }

    #[test]
    fn test_reference_point_id_distinguishes_fields() {
        let ids: HashSet<u64> = [
            reference_point_id("scoring_rubric", Some("cv_evaluation"), 0),
            reference_point_id("scoring_rubric", Some("project_evaluation"), 0),
            reference_point_id("scoring_rubric", None, 0),
            reference_point_id("job_description", None, 0),
            reference_point_id("job_description", None, 1),
        ]
        .into_iter()
        .collect();

        assert_eq!(ids.len(), 5);
    }

    #[test]
    fn test_separator_prevents_concatenation_collisions() {
        assert_ne!(
            reference_point_id("ab", Some("c"), 0),
            reference_point_id("a", Some("bc"), 0)
        );
    }
}
