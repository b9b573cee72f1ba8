//! 命令行集成测试

use std::fs;
use std::path::Path;

use assert_cmd::Command;

const ENV_VARS: &[&str] = &[
    "I18N_CACHE_API_URL",
    "I18N_CACHE_DEFAULT_LANG",
    "I18N_CACHE_MAX_BYTES",
    "I18N_CACHE_PREFERENCE_EXPIRY_HOURS",
    "I18N_CACHE_REPORT_MISSING",
    "I18N_CACHE_REQUEST_TIMEOUT",
    "I18N_CACHE_STORAGE_PATH",
    "I18N_CACHE_TOUCH_ON_READ",
    "I18N_CACHE_TTL",
];

/// 在隔离的工作目录中运行，存储文件放在该目录下
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("i18n-cache").unwrap();
    cmd.current_dir(dir)
        .env("HOME", dir)
        .env("I18N_CACHE_LOG_LEVEL", "error")
        .arg("--store")
        .arg(dir.join("store.redb"));
    for name in ENV_VARS {
        cmd.env_remove(name);
    }
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

fn write_resources(dir: &Path) {
    let ja = dir.join("resources").join("ja");
    fs::create_dir_all(&ja).unwrap();
    fs::write(
        ja.join("common.json"),
        r#"{"hello": "こんにちは", "greet": "{{name}}さん、ようこそ"}"#,
    )
    .unwrap();
}

#[test]
fn test_env_docs_lists_variables() {
    let dir = tempfile::tempdir().unwrap();
    let out = stdout_of(cli(dir.path()).arg("env-docs"));
    assert!(out.contains("I18N_CACHE_TTL"));
    assert!(out.contains("I18N_CACHE_API_URL"));
}

#[test]
fn test_init_config_then_use_it() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("custom.toml");
    let config = config.to_str().unwrap();

    cli(dir.path()).args(["init-config", config]).assert().success();
    let content = fs::read_to_string(config).unwrap();
    assert!(content.contains("max_cache_bytes"));

    let out = stdout_of(cli(dir.path()).args(["--config", config, "stats"]));
    assert!(out.contains("\"total_entries\": 0"));
}

#[test]
fn test_preference_round_trip() {
    let dir = tempfile::tempdir().unwrap();

    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "");
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "set", "en"])), "en\n");
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "en\n");

    cli(dir.path())
        .args(["preference", "set", "fr"])
        .assert()
        .failure();
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "en\n");

    cli(dir.path()).args(["preference", "clear"]).assert().success();
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "");
}

#[test]
fn test_fetch_stats_resolve_and_clear() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let resources = dir.path().join("resources");
    let resources = resources.to_str().unwrap();

    let out = stdout_of(cli(dir.path()).args([
        "fetch", "--lang", "ja", "-n", "common", "--from-dir", resources,
    ]));
    assert_eq!(out, "ja/common\n");

    let stats = stdout_of(cli(dir.path()).arg("stats"));
    assert!(stats.contains("\"total_entries\": 1"));
    assert!(stats.contains("\"ja\""));

    // 中文回退到日文
    let out = stdout_of(cli(dir.path()).args([
        "resolve", "hello", "--lang", "zh", "--from-dir", resources,
    ]));
    assert_eq!(out, "こんにちは\n");

    let out = stdout_of(cli(dir.path()).args([
        "resolve", "greet", "--lang", "ja", "-p", "name=Aki", "--from-dir", resources,
    ]));
    assert_eq!(out, "Akiさん、ようこそ\n");

    let out = stdout_of(cli(dir.path()).args([
        "resolve", "absent", "--lang", "en", "--default", "Fallback", "--from-dir", resources,
    ]));
    assert_eq!(out, "Fallback\n");

    assert_eq!(stdout_of(cli(dir.path()).args(["clear", "--expired"])), "0\n");
    assert_eq!(stdout_of(cli(dir.path()).arg("clear")), "1\n");
}

#[test]
fn test_switch_persists_preference() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let resources = dir.path().join("resources");
    let resources = resources.to_str().unwrap();

    let out = stdout_of(cli(dir.path()).args(["switch", "zh", "--from-dir", resources]));
    assert_eq!(out, "zh\n");
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "zh\n");

    cli(dir.path())
        .args(["switch", "de", "--from-dir", resources])
        .assert()
        .failure();
}

#[test]
fn test_switch_accepts_region_tag() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    let resources = dir.path().join("resources");
    let resources = resources.to_str().unwrap();

    let out = stdout_of(cli(dir.path()).args(["switch", "ja-JP", "--from-dir", resources]));
    assert_eq!(out, "ja\n");
    assert_eq!(stdout_of(cli(dir.path()).args(["preference", "get"])), "ja\n");
}

#[test]
fn test_log_level_from_dotenv_file() {
    let dir = tempfile::tempdir().unwrap();
    write_resources(dir.path());
    fs::write(dir.path().join(".env"), "I18N_CACHE_LOG_LEVEL=debug\n").unwrap();
    let resources = dir.path().join("resources");
    let resources = resources.to_str().unwrap();

    let output = cli(dir.path())
        .env_remove("I18N_CACHE_LOG_LEVEL")
        .args(["resolve", "hello", "--lang", "ja", "--from-dir", resources])
        .assert()
        .success()
        .get_output()
        .clone();

    assert_eq!(String::from_utf8(output.stdout).unwrap(), "こんにちは\n");
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("载入命名空间"), "stderr: {}", stderr);
}

#[test]
fn test_import_dry_run_flattens_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("en.json");
    fs::write(&file, r#"{"menu": {"home": "Home", "count": 3}}"#).unwrap();

    let out = stdout_of(cli(dir.path()).args([
        "import",
        file.to_str().unwrap(),
        "--lang",
        "en",
        "--namespace",
        "navigation",
        "--dry-run",
    ]));

    let body: serde_json::Value = serde_json::from_str(&out).unwrap();
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["resource_key"], "menu.home");
    assert_eq!(items[0]["namespace"], "navigation");
    assert_eq!(items[0]["language_code"], "en");
}
