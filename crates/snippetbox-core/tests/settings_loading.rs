//! Integration tests for loading settings from disk.

use std::io::Write;
use std::path::PathBuf;

use snippetbox_core::settings_loader;
use snippetbox_core::CoreError;

#[test]
fn test_load_settings_from_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
addr = "0.0.0.0:4443"
debug = true
template_dir = "/srv/snippetbox/html"
session_lifetime_secs = 60
"#
    )
    .unwrap();

    let settings = settings_loader::from_toml_file(file.path()).unwrap();
    assert_eq!(settings.addr, "0.0.0.0:4443");
    assert!(settings.debug);
    assert_eq!(settings.template_dir, PathBuf::from("/srv/snippetbox/html"));
    assert_eq!(settings.session_lifetime_secs, 60);
    assert_eq!(settings.static_dir, PathBuf::from("./ui/static"));
}

#[test]
fn test_empty_toml_file_yields_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let settings = settings_loader::from_toml_file(file.path()).unwrap();
    assert_eq!(settings, snippetbox_core::Settings::default());
}

#[test]
fn test_unknown_type_is_configuration_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "session_lifetime_secs = \"forever\"").unwrap();

    let err = settings_loader::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, CoreError::ImproperlyConfigured(_)));
}
