use rendernet::EngineConfig;
use std::io::Write;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"table_capacity": 32, "cache_capacity": 4}}"#).unwrap();

    let config = EngineConfig::load(file.path()).unwrap();
    assert_eq!(config.table_capacity, 32);
    assert_eq!(config.cache_capacity, 4);
    assert_eq!(config.frame_size, EngineConfig::default().frame_size);
}

#[test]
fn test_load_rejects_malformed() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "not json").unwrap();
    assert!(EngineConfig::load(file.path()).is_err());

    let dir = tempfile::tempdir().unwrap();
    assert!(EngineConfig::load(dir.path().join("absent.json")).is_err());
}
