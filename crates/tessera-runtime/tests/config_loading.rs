use std::{env, fs};

use tessera_runtime::config::loader::{load_config, load_config_with_default_path};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tessera.toml");

    let toml_content = r#"
[redis]
enabled = false
url = "redis://cache:6379"
timeout_ms = 100

[cache]
local_ttl_secs = 120
flag_ttl_secs = 15

[postgres]
url = "postgres://tessera:tessera@db:5432/tessera"
max_connections = 4

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses; unspecified fields keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.redis.url, "redis://cache:6379");
    assert_eq!(cfg.redis.pool_size, 10);
    assert_eq!(cfg.cache.local_ttl_secs, 120);
    assert_eq!(cfg.cache.flag_ttl_secs, 15);
    assert_eq!(cfg.cache.all_ttl_secs, 900);
    let pg = cfg.postgres.as_ref().expect("postgres section");
    assert_eq!(pg.max_connections, 4);
    assert_eq!(pg.acquire_timeout_secs, 5);
    assert!(pg.ensure_schema);
    assert_eq!(cfg.logging.level, "debug");

    let policy = cfg.cache.policy();
    assert_eq!(policy.local_ttl.as_secs(), 120);
    assert_eq!(policy.public_ttl.as_secs(), 600);

    // 2) Env override should win over file
    unsafe {
        env::set_var("TESSERA__CACHE__FLAG_TTL_SECS", "5");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.cache.flag_ttl_secs, 5);
    unsafe {
        env::remove_var("TESSERA__CACHE__FLAG_TTL_SECS");
    }

    // 3) Invalid values fail validation
    let bad_path = dir.path().join("bad.toml");
    fs::write(
        &bad_path,
        r#"
[cache]
defaults_ttl_secs = 1000
"#,
    )
    .expect("write bad toml");
    let err = load_config(bad_path.to_str()).expect_err("validation should fail");
    assert!(err.contains("defaults_ttl_secs"));

    // 4) A missing file falls back to defaults
    let missing = dir.path().join("absent.toml");
    let cfg_default = load_config_with_default_path(Some(&missing)).expect("defaults");
    assert!(cfg_default.postgres.is_none());
    assert!(!cfg_default.redis.enabled);
}
