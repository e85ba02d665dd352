//! Consumer-secret redaction.
//!
//! Typed routes go through [`redact`]; passthrough responses, whose shape is
//! unknown, go through [`scrub_secrets`].

use serde_json::Value;

use crate::models::app::App;

/// Fixed marker written over every consumer secret.
pub const REDACTION_MARKER: &str = "**********";

/// JSON key holding a credential's secret in management API payloads.
pub const SECRET_FIELD: &str = "consumerSecret";

/// Overwrite the secret of every credential on `app`.
///
/// Credential order and every other field are left as received.
pub fn redact(mut app: App) -> App {
    tracing::info!("about to wipe credentials from app: {}", app.name);
    for credential in &mut app.credentials {
        credential.consumer_secret = REDACTION_MARKER.to_string();
    }
    app
}

/// Overwrite every `consumerSecret` key at any depth of `v`.
///
/// Returns how many fields were rewritten.
pub fn scrub_secrets(v: &mut Value) -> usize {
    let mut count = 0;
    scrub_value(v, &mut count);
    count
}

fn scrub_value(v: &mut Value, count: &mut usize) {
    match v {
        Value::Object(obj) => {
            if let Some(secret) = obj.get_mut(SECRET_FIELD) {
                *secret = Value::String(REDACTION_MARKER.to_string());
                *count += 1;
            }
            for (key, val) in obj.iter_mut() {
                if key != SECRET_FIELD {
                    scrub_value(val, count);
                }
            }
        }
        Value::Array(arr) => {
            for item in arr {
                scrub_value(item, count);
            }
        }
        _ => {}
    }
}

// ── Tests ────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app_with(credentials: Value) -> App {
        serde_json::from_value(json!({
            "name": "foo",
            "appId": "123",
            "credentials": credentials,
        }))
        .unwrap()
    }

    #[test]
    fn test_redact_masks_every_credential() {
        let app = app_with(json!([
            {"consumerSecret": "A", "consumerKey": "k1"},
            {"consumerSecret": "B", "consumerKey": "k2"},
            {"consumerSecret": "C", "consumerKey": "k3"}
        ]));

        let out = redact(app);

        assert_eq!(out.credentials.len(), 3);
        assert!(out
            .credentials
            .iter()
            .all(|c| c.consumer_secret == REDACTION_MARKER));
    }

    #[test]
    fn test_redact_preserves_order_and_other_fields() {
        let app = app_with(json!([
            {"consumerSecret": "A", "consumerKey": "k1", "status": "approved", "expiresAt": -1},
            {"consumerSecret": "B", "consumerKey": "k2", "apiProducts": [{"apiproduct": "gold"}]}
        ]));
        let before = app.clone();

        let out = redact(app);

        for (orig, masked) in before.credentials.iter().zip(&out.credentials) {
            assert_eq!(orig.extra, masked.extra);
        }
        assert_eq!(out.credentials[0].extra["consumerKey"], "k1");
        assert_eq!(out.credentials[1].extra["consumerKey"], "k2");
        assert_eq!(out.name, before.name);
        assert_eq!(out.app_id, before.app_id);
        assert_eq!(out.extra, before.extra);
    }

    #[test]
    fn test_redact_is_idempotent() {
        let app = app_with(json!([{"consumerSecret": "XYZ", "apiKey": "K"}]));
        let once = redact(app);
        let twice = redact(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_redact_no_credentials() {
        let app = app_with(json!([]));
        assert!(redact(app).credentials.is_empty());
    }

    #[test]
    fn test_scrub_nested_arrays_and_objects() {
        let mut body = json!({
            "app": [
                {"name": "a", "credentials": [{"consumerSecret": "s1", "consumerKey": "k1"}]},
                {"name": "b", "credentials": [{"consumerSecret": "s2"}, {"consumerSecret": "s3"}]}
            ],
            "developer": {"apps": {"inner": {"consumerSecret": "s4"}}}
        });

        let count = scrub_secrets(&mut body);

        assert_eq!(count, 4);
        assert_eq!(body["app"][0]["credentials"][0]["consumerSecret"], REDACTION_MARKER);
        assert_eq!(body["app"][0]["credentials"][0]["consumerKey"], "k1");
        assert_eq!(body["app"][1]["credentials"][1]["consumerSecret"], REDACTION_MARKER);
        assert_eq!(body["developer"]["apps"]["inner"]["consumerSecret"], REDACTION_MARKER);
    }

    #[test]
    fn test_scrub_replaces_non_string_secrets() {
        let mut body = json!({"consumerSecret": {"value": "hidden"}});
        assert_eq!(scrub_secrets(&mut body), 1);
        assert_eq!(body, json!({"consumerSecret": REDACTION_MARKER}));
    }

    #[test]
    fn test_scrub_leaves_unrelated_payloads_alone() {
        let original = json!({"environments": [{"name": "prod", "metrics": [1, 2, 3]}]});
        let mut body = original.clone();
        assert_eq!(scrub_secrets(&mut body), 0);
        assert_eq!(body, original);
    }

    #[test]
    fn test_scrub_is_case_sensitive() {
        let mut body = json!({"consumersecret": "keep", "ConsumerSecret": "keep"});
        assert_eq!(scrub_secrets(&mut body), 0);
        assert_eq!(body["consumersecret"], "keep");
    }
}
