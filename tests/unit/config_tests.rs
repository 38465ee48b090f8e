// Configuration module unit tests

use std::io::Write;
use watermarking::config::*;
use watermarking::watermark::WatermarkError;

#[test]
fn test_empty_yaml_uses_defaults() {
    let config: Config = serde_yaml::from_str("{}").expect("Failed to deserialize YAML");

    assert_eq!(config, Config::default());
    assert_eq!(config.fetcher.timeout_secs, 30);
    assert_eq!(config.placement.offset_x, 200.0);
    assert_eq!(config.placement.offset_y, 200.0);
    assert_eq!(config.image_watermark.opacity, 0.5);
    assert_eq!(config.text_watermark.font_size, 108.0);
    assert_eq!(config.text_watermark.color, "#008000");
    assert_eq!(config.text_watermark.opacity, 0.5);
    assert!(config.fonts.load_system_fonts);
    assert_eq!(config.output.jpeg_quality, 75);
    assert_eq!(config.logging.format, LogFormat::Pretty);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_sections_keep_remaining_defaults() {
    let yaml = r##"
placement:
  offset_x: 10
text_watermark:
  color: "#FFF"
logging:
  format: json
  level: debug
"##;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert_eq!(config.placement.offset_x, 10.0);
    assert_eq!(config.placement.offset_y, 200.0);
    assert_eq!(config.text_watermark.color, "#FFF");
    assert_eq!(config.text_watermark.font_size, 108.0);
    assert_eq!(config.logging.format, LogFormat::Json);
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_env_var_substitution() {
    std::env::set_var("WATERMARKING_TEST_FONT_DIR", "/opt/fonts");
    let yaml = r#"
fonts:
  load_system_fonts: false
  dirs:
    - "${WATERMARKING_TEST_FONT_DIR}"
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();

    assert!(!config.fonts.load_system_fonts);
    assert_eq!(config.fonts.dirs, vec![std::path::PathBuf::from("/opt/fonts")]);
}

#[test]
fn test_missing_env_var_is_config_error() {
    let yaml = "output:\n  jpeg_quality: ${WATERMARKING_TEST_DEFINITELY_UNSET}\n";
    let err = Config::from_yaml_with_env(yaml).unwrap_err();

    assert!(matches!(err, WatermarkError::Config(_)));
    assert!(err
        .to_string()
        .contains("WATERMARKING_TEST_DEFINITELY_UNSET"));
}

#[test]
fn test_malformed_yaml_is_config_error() {
    let err = Config::from_yaml_with_env("placement: [1, 2").unwrap_err();
    assert_eq!(err.status_hint(), Some(500));
}

#[test]
fn test_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "output:\n  jpeg_quality: 90").unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.output.jpeg_quality, 90);
}

#[test]
fn test_from_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::from_file(dir.path().join("nope.yaml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

#[test]
fn test_validate_rejects_out_of_range_values() {
    let cases: [(&str, fn(&mut Config)); 8] = [
        ("timeout", |c: &mut Config| c.fetcher.timeout_secs = 0),
        ("body limit", |c: &mut Config| c.fetcher.max_body_bytes = 0),
        ("offset", |c: &mut Config| c.placement.offset_x = f32::NAN),
        ("image opacity", |c: &mut Config| c.image_watermark.opacity = 1.5),
        ("text opacity", |c: &mut Config| c.text_watermark.opacity = -0.1),
        ("font size", |c: &mut Config| c.text_watermark.font_size = 0.0),
        ("color", |c: &mut Config| c.text_watermark.color = "green".to_string()),
        ("quality", |c: &mut Config| c.output.jpeg_quality = 101),
    ];

    for (name, mutate) in cases {
        let mut config = Config::default();
        mutate(&mut config);
        assert!(config.validate().is_err(), "{name} should be rejected");
    }
}
