//! Local lead-assignment receiver.
//!
//! Stands in for the assignment service during development: it derives a
//! zone key and a stable franchisee id from the lead's location and returns
//! a follow-up task.

use axum::Json;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// Length of the hex franchisee id.
const FRANCHISEE_ID_LEN: usize = 10;

fn field<'a>(lead: &'a Value, keys: &[&str]) -> &'a str {
    keys.iter()
        .find_map(|k| lead.get(*k).and_then(Value::as_str))
        .unwrap_or_default()
}

/// `city-zone`, both trimmed and lowercased.
pub fn zone_key(city: &str, zone: &str) -> String {
    format!(
        "{}-{}",
        city.trim().to_lowercase(),
        zone.trim().to_lowercase()
    )
}

/// First ten hex characters of SHA-256 over the zone key.
pub fn franchisee_id(zone_key: &str) -> String {
    let digest = Sha256::digest(zone_key.as_bytes());
    let mut id = hex::encode(digest);
    id.truncate(FRANCHISEE_ID_LEN);
    id
}

/// POST /assign
pub async fn assign_handler(Json(lead): Json<Value>) -> Json<Value> {
    let key = zone_key(
        field(&lead, &["city", "poblacion"]),
        field(&lead, &["zone", "zona"]),
    );
    let fid = franchisee_id(&key);
    tracing::info!(zone_key = %key, franchisee_id = %fid, "lead assigned");

    Json(json!({
        "ok": true,
        "task": {
            "title": "Contactar lead",
            "zone_key": key,
            "franchisee_id": fid,
            "lead": lead,
            "created_at": chrono::Utc::now().timestamp(),
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_key_normalizes() {
        assert_eq!(zone_key("  Madrid ", "CENTRO"), "madrid-centro");
        assert_eq!(zone_key("", ""), "-");
    }

    #[test]
    fn franchisee_id_is_stable_hex() {
        let id = franchisee_id("madrid-centro");
        assert_eq!(id.len(), 10);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, franchisee_id("madrid-centro"));
        assert_ne!(id, franchisee_id("madrid-salamanca"));
        // sha256("") starts with e3b0c44298
        assert_eq!(franchisee_id(""), "e3b0c44298");
    }

    #[test]
    fn field_accepts_legacy_keys() {
        let lead = json!({"poblacion": "Sevilla", "zone": "Triana"});
        assert_eq!(field(&lead, &["city", "poblacion"]), "Sevilla");
        assert_eq!(field(&lead, &["zone", "zona"]), "Triana");
        assert_eq!(field(&lead, &["name"]), "");
    }
}
