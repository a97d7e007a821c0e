// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! File-based configuration tests.

#![cfg(feature = "config-loaders")]

use std::io::Write;

use biceps::{ConfigError, Error, LocalMdibAccess, MdibConfig};

fn write_config(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(content.as_bytes()).expect("write config");
    file
}

#[test]
fn test_load_from_file() {
    let file = write_config(
        r#"
        instance_label = "bed-12"
        read_lock_timeout_ms = 200
        check_context_handles = false
        "#,
    );
    let config = MdibConfig::from_file(file.path()).expect("valid config");
    assert_eq!(config.instance_label, "bed-12");
    assert_eq!(config.read_lock_timeout_ms, 200);
    assert!(!config.check_context_handles);

    let mdib = LocalMdibAccess::with_config(config.clone()).expect("access");
    assert_eq!(mdib.config(), &config);
}

#[test]
fn test_invalid_file_contents() {
    let file = write_config("read_lock_timeout_ms = 0\n");
    assert!(matches!(
        MdibConfig::from_file(file.path()),
        Err(ConfigError::Invalid(_))
    ));

    let file = write_config("read_lock_timeout_ms = \"soon\"\n");
    assert!(matches!(
        MdibConfig::from_file(file.path()),
        Err(ConfigError::Toml(_))
    ));

    assert!(matches!(
        MdibConfig::from_file("/nonexistent/biceps.toml"),
        Err(ConfigError::Io(_))
    ));
}

#[test]
fn test_access_rejects_invalid_config() {
    let config = MdibConfig {
        instance_label: String::new(),
        ..MdibConfig::default()
    };
    assert!(matches!(
        LocalMdibAccess::with_config(config),
        Err(Error::Config(ConfigError::Invalid(_)))
    ));
}
