use serde_json::Value;

/// Masks credentials in JSON bodies before they are logged.
pub fn sanitize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sanitized = serde_json::Map::new();
            for (key, val) in map {
                let sanitized_val = if is_sensitive_field(key) {
                    mask_value(val)
                } else {
                    sanitize_json(val)
                };
                sanitized.insert(key.clone(), sanitized_val);
            }
            Value::Object(sanitized)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sanitize_json).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_field(key: &str) -> bool {
    matches!(
        key.to_lowercase().as_str(),
        "password" | "confirmpassword" | "confirm_password" | "token" | "authorization"
    )
}

fn mask_value(value: &Value) -> Value {
    match value {
        // Tokens stay recognisable by their edges.
        Value::String(s) if s.len() > 16 && s.is_char_boundary(4) && s.is_char_boundary(s.len() - 4) => {
            Value::String(format!("{}****{}", &s[..4], &s[s.len() - 4..]))
        }
        _ => Value::String("****".to_string()),
    }
}
