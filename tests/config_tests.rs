//! Tests for config parsing and environment overrides

#[cfg(test)]
mod config_tests {
    use neonchat::config::*;
    use std::collections::HashMap;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.api_base(), DEFAULT_API_BASE_URL);
        assert!(!config.dev_bypass_auth);
    }

    #[test]
    fn parses_all_keys() {
        let config = parse_config(
            r#"
api_base_url = "https://chat.example.com"
origin = "https://web.example.com/"
dev_bypass_auth = true
"#,
        )
        .unwrap();
        assert_eq!(config.api_base(), "https://chat.example.com");
        assert_eq!(config.ws_origin().as_deref(), Some("https://web.example.com"));
        assert!(config.dev_bypass_auth);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(parse_config("api_base_url = ").is_err());
    }

    #[test]
    fn origin_derived_from_base() {
        let config = parse_config(r#"api_base_url = "http://localhost:8080/""#).unwrap();
        assert_eq!(config.ws_origin().as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = parse_config(r#"api_base_url = "http://a:1""#).unwrap();
        let env: HashMap<&str, &str> = [
            (ENV_API_BASE_URL, " http://b:2 "),
            (ENV_DEV_BYPASS_AUTH, "true"),
        ]
        .into_iter()
        .collect();
        config.apply_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.api_base(), "http://b:2");
        assert!(config.dev_bypass_auth);
        assert!(config.origin.is_empty());
    }

    #[test]
    fn bypass_only_in_debug_builds() {
        let config = parse_config("dev_bypass_auth = true").unwrap();
        assert_eq!(config.bypass_enabled(), cfg!(debug_assertions));
    }
}
