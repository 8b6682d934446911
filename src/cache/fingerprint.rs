//! Cache key derivation.

use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::types::ScopeKey;

/// Truncated hex length. 128 bits of a SHA-256 digest: ample for a
/// performance cache, not a trust boundary.
const FINGERPRINT_LEN: usize = 32;

/// Derive the cache key for a request.
///
/// The full scope is hashed ahead of the operation and payload, so entries
/// from different scopes can only collide through a digest truncation
/// collision. Payload canonicalization relies on `serde_json::Value` ordering
/// object keys.
pub fn fingerprint(scope: &ScopeKey, operation: &str, payload: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(scope.to_string().as_bytes());
    hasher.update([0u8]);
    hasher.update(operation.as_bytes());
    hasher.update([0u8]);
    hasher.update(payload.to_string().as_bytes());

    let digest = hasher.finalize();
    let mut key = hex::encode(digest);
    key.truncate(FINGERPRINT_LEN);
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn test_deterministic() {
        let scope = ScopeKey::user(Uuid::new_v4());
        let payload = json!({"prompt": "list open ports"});

        let a = fingerprint(&scope, "generate", &payload);
        let b = fingerprint(&scope, "generate", &payload);
        assert_eq!(a, b);
        assert_eq!(a.len(), FINGERPRINT_LEN);
    }

    #[test]
    fn test_scope_changes_key() {
        let payload = json!({"prompt": "list open ports"});
        let a = fingerprint(&ScopeKey::user(Uuid::new_v4()), "generate", &payload);
        let b = fingerprint(&ScopeKey::user(Uuid::new_v4()), "generate", &payload);
        assert_ne!(a, b);
    }

    #[test]
    fn test_operation_changes_key() {
        let scope = ScopeKey::user(Uuid::new_v4());
        let payload = json!({"prompt": "list open ports"});
        assert_ne!(
            fingerprint(&scope, "generate", &payload),
            fingerprint(&scope, "enhance", &payload)
        );
    }

    #[test]
    fn test_payload_changes_key() {
        let scope = ScopeKey::user(Uuid::new_v4());
        assert_ne!(
            fingerprint(&scope, "generate", &json!({"prompt": "a"})),
            fingerprint(&scope, "generate", &json!({"prompt": "b"}))
        );
    }
}
