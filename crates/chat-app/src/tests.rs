#[cfg(test)]
mod tests {
    use crate::client::{interop_error, parse_config};
    use std::collections::HashMap;
    use chat_types::config::*;
    use chat_types::ChatError;

    // ─── Config Parsing Tests ────────────────────────────────

    #[test]
    fn test_parse_config_absent_is_default() {
        assert_eq!(parse_config(None).unwrap(), ClientConfig::default());
        assert_eq!(parse_config(Some("  ")).unwrap(), ClientConfig::default());
    }

    #[test]
    fn test_parse_config_partial() {
        let config = parse_config(Some(
            r#"{"api": {"base_url": "https://chat.example.org"}, "refresh_interval_secs": 0}"#,
        ))
        .unwrap();
        assert_eq!(config.api.base_url, "https://chat.example.org");
        assert_eq!(config.api.chat_endpoint, "/chat-groq/");
        assert_eq!(config.refresh_interval_secs, 0);
        assert_eq!(config.storage.key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn test_parse_config_storage_backend() {
        let config = parse_config(Some(r#"{"storage": {"backend": "Memory"}}"#)).unwrap();
        assert_eq!(config.storage.backend, StorageBackendType::Memory);
    }

    #[test]
    fn test_parse_config_invalid() {
        let err = parse_config(Some("{not json")).unwrap_err();
        assert!(matches!(err, ChatError::Config(_)));

        let err = parse_config(Some(r#"{"refresh_interval_secs": "soon"}"#)).unwrap_err();
        assert!(err.to_string().starts_with("Configuration error"));
    }

    // ─── JS Boundary Tests ───────────────────────────────────

    #[test]
    fn test_unencodable_value_is_interop_error() {
        // JSON object keys must be strings
        let mut map = HashMap::new();
        map.insert((1, 2), 3);
        let err = interop_error(serde_json::to_value(&map).unwrap_err());
        assert!(matches!(err, ChatError::JsInterop(_)));
        assert!(err.to_string().starts_with("JS interop error: "));
        assert!(!err.is_transport());
    }
}
