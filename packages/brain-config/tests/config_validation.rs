use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use brain_config::{Config, Error};

const SAMPLE_CONFIG_TOML: &str = include_str!("fixtures/sample_config.toml");

fn sample_toml_with(section: &[&str], key: &str, value: Value) -> String {
	let mut root: Value = toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse sample config.");
	let mut table = root.as_table_mut().expect("Sample config must be a table.");

	for name in section {
		table = table
			.get_mut(*name)
			.and_then(Value::as_table_mut)
			.unwrap_or_else(|| panic!("Sample config must include [{name}]."));
	}

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render sample config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("brain_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn base_config() -> Config {
	toml::from_str(SAMPLE_CONFIG_TOML).expect("Failed to parse test config.")
}

#[test]
fn loads_sample_config_and_normalizes_api_base() {
	let path = write_temp_config(SAMPLE_CONFIG_TOML.to_string());
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Sample config must load.");

	assert_eq!(cfg.api.api_base, "http://127.0.0.1:3000");
	assert_eq!(cfg.api.api_key.as_deref(), Some("secret"));
	assert_eq!(cfg.search.debounce_ms, 350);
	assert_eq!(cfg.poller.interval_ms, 3_000);
}

#[test]
fn blank_api_key_is_treated_as_missing() {
	let payload = sample_toml_with(&["api"], "api_key", Value::String("   ".to_string()));
	let path = write_temp_config(payload);
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let cfg = result.expect("Blank api_key must not fail validation.");

	assert!(cfg.api.api_key.is_none());
}

#[test]
fn minimal_config_uses_defaults() {
	let cfg: Config = toml::from_str("[api]\napi_base = \"https://brain.example\"\n")
		.expect("Minimal config must parse.");

	assert!(brain_config::validate(&cfg).is_ok());
	assert_eq!(cfg.service.log_level, "info");
	assert_eq!(cfg.search.debounce_ms, 350);
	assert_eq!(cfg.search.result_limit, 3);
	assert_eq!(cfg.search.cache.ttl_ms, 300_000);
	assert_eq!(cfg.search.relevance.max_results, 3);
	assert_eq!(cfg.poller.interval_ms, 3_000);
	assert_eq!(cfg.api.paths.search, "/api/v1/search");
}

#[test]
fn missing_file_reports_read_error() {
	let mut path = env::temp_dir();

	path.push("brain_config_test_missing_file.toml");

	let err = brain_config::load(&path).expect_err("Expected read error.");

	assert!(matches!(err, Error::ReadConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn malformed_toml_reports_parse_error() {
	let path = write_temp_config("[api\napi_base = ".to_string());
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected parse error.");

	assert!(matches!(err, Error::ParseConfig { .. }), "Unexpected error: {err}");
}

#[test]
fn api_base_must_have_http_scheme() {
	let payload =
		sample_toml_with(&["api"], "api_base", Value::String("ftp://brain.example".to_string()));
	let path = write_temp_config(payload);
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected api_base validation error.");

	assert!(
		err.to_string().contains("api.api_base must start with http:// or https://."),
		"Unexpected error: {err}"
	);
}

#[test]
fn cache_ttl_must_be_positive_when_enabled() {
	let mut cfg = base_config();

	cfg.search.cache.ttl_ms = 0;

	let err = brain_config::validate(&cfg).expect_err("Expected cache TTL validation error.");

	assert!(
		err.to_string().contains("search.cache.ttl_ms must be greater than zero when enabled."),
		"Unexpected error: {err}"
	);

	cfg.search.cache.enabled = false;

	assert!(brain_config::validate(&cfg).is_ok());
}

#[test]
fn relevance_thresholds_must_be_in_unit_range() {
	let mut cfg = base_config();

	cfg.search.relevance.min_second_score = 1.5;

	let err = brain_config::validate(&cfg).expect_err("Expected relevance validation error.");

	assert!(
		err.to_string().contains("search.relevance.min_second_score must be in the range 0.0-1.0."),
		"Unexpected error: {err}"
	);

	cfg = base_config();
	cfg.search.relevance.dominance_gap = f64::NAN;

	let err = brain_config::validate(&cfg).expect_err("Expected finite validation error.");

	assert!(
		err.to_string().contains("search.relevance.dominance_gap must be a finite number."),
		"Unexpected error: {err}"
	);
}

#[test]
fn poll_interval_must_be_positive() {
	let payload = sample_toml_with(&["poller"], "interval_ms", Value::Integer(0));
	let path = write_temp_config(payload);
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected poller validation error.");

	assert!(
		err.to_string().contains("poller.interval_ms must be greater than zero."),
		"Unexpected error: {err}"
	);
}

#[test]
fn default_headers_must_be_strings() {
	let payload =
		sample_toml_with(&["api", "default_headers"], "x-retries", Value::Integer(3));
	let path = write_temp_config(payload);
	let result = brain_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	let err = result.expect_err("Expected header validation error.");

	assert!(
		err.to_string().contains("api.default_headers.x-retries must be a string."),
		"Unexpected error: {err}"
	);
}
