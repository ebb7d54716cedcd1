mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Api, ApiPaths, Config, Poller, Search, SearchCache, SearchRelevance, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	let api_base = cfg.api.api_base.trim();

	if api_base.is_empty() {
		return Err(Error::Validation { message: "api.api_base must be non-empty.".to_string() });
	}
	if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
		return Err(Error::Validation {
			message: "api.api_base must start with http:// or https://.".to_string(),
		});
	}
	if cfg.api.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "api.timeout_ms must be greater than zero.".to_string(),
		});
	}

	for (label, path) in [
		("api.paths.search", &cfg.api.paths.search),
		("api.paths.summarize", &cfg.api.paths.summarize),
		("api.paths.content", &cfg.api.paths.content),
	] {
		if !path.starts_with('/') {
			return Err(Error::Validation { message: format!("{label} must start with '/'.") });
		}
	}
	for (key, value) in &cfg.api.default_headers {
		if !value.is_string() {
			return Err(Error::Validation {
				message: format!("api.default_headers.{key} must be a string."),
			});
		}
	}

	if cfg.search.result_limit == 0 {
		return Err(Error::Validation {
			message: "search.result_limit must be greater than zero.".to_string(),
		});
	}

	let relevance = &cfg.search.relevance;

	for (label, value) in [
		("search.relevance.dominance_gap", relevance.dominance_gap),
		("search.relevance.min_second_score", relevance.min_second_score),
	] {
		if !value.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if !(0.0..=1.0).contains(&value) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 0.0-1.0."),
			});
		}
	}

	if relevance.max_results == 0 {
		return Err(Error::Validation {
			message: "search.relevance.max_results must be greater than zero.".to_string(),
		});
	}
	if cfg.search.cache.enabled {
		if cfg.search.cache.ttl_ms == 0 {
			return Err(Error::Validation {
				message: "search.cache.ttl_ms must be greater than zero when enabled.".to_string(),
			});
		}
		if cfg.search.cache.max_entries == 0 {
			return Err(Error::Validation {
				message: "search.cache.max_entries must be greater than zero when enabled."
					.to_string(),
			});
		}
	}
	if cfg.poller.interval_ms == 0 {
		return Err(Error::Validation {
			message: "poller.interval_ms must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.api.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.api.api_key = None;
	}

	let trimmed = cfg.api.api_base.trim().trim_end_matches('/').to_string();

	cfg.api.api_base = trimmed;
}
