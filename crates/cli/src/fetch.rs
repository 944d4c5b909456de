//! `slipgen fetch`: download transfer JSON and emit canonical CSV.
//!
//! - `FetchClient`: HTTP client with retry / backoff / error classification
//! - `resolve_token`: flag > env > none
//!
//! Status handling:
//!
//! | Status      | Behavior                         | Exit code               |
//! |-------------|----------------------------------|-------------------------|
//! | 2xx         | body parsed as JSON              | -                       |
//! | 401 / 403   | fail immediately                 | `EXIT_FETCH_AUTH`       |
//! | 400         | fail immediately                 | `EXIT_FETCH_VALIDATION` |
//! | other 4xx   | fail immediately                 | `EXIT_FETCH_UPSTREAM`   |
//! | 429         | retry, honoring `Retry-After`    | `EXIT_FETCH_RATE_LIMIT` |
//! | 5xx / net   | retry with exponential backoff   | `EXIT_FETCH_UPSTREAM`   |

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde_json::Value;
use slipgen_engine::SourceSystem;
use slipgen_io::Loaded;

use crate::exit_codes;
use crate::input::{
    dropped_note, load_settings, normalize_loaded, remember, require_records, write_csv,
};
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("slipgen/", env!("CARGO_PKG_VERSION"));
pub const TOKEN_ENV: &str = "SLIPGEN_API_TOKEN";

// ── FetchClient ─────────────────────────────────────────────────────

pub struct FetchClient {
    http: reqwest::blocking::Client,
    initial_backoff: Duration,
}

impl FetchClient {
    pub fn new() -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError::general(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { http, initial_backoff: Duration::from_secs(1) })
    }

    #[cfg(test)]
    fn with_backoff(mut self, backoff: Duration) -> Self {
        self.initial_backoff = backoff;
        self
    }

    /// GET `url` as JSON with retry + exponential backoff.
    pub fn get_json(&self, url: &str, token: Option<&str>) -> Result<Value, CliError> {
        let mut backoff = self.initial_backoff;

        for attempt in 0..=MAX_RETRIES {
            let mut req = self.http.get(url).header("Accept", "application/json");
            if let Some(token) = token {
                req = req.bearer_auth(token);
            }

            match req.send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    // Auth errors: fail immediately
                    if status == 401 || status == 403 {
                        let msg = error_message(resp);
                        let err = CliError {
                            code: exit_codes::EXIT_FETCH_AUTH,
                            message: format!("auth failed ({status}): {msg}"),
                            hint: None,
                        };
                        return Err(if token.is_none() {
                            err.with_hint(format!("pass --token or set {TOKEN_ENV}"))
                        } else {
                            err
                        });
                    }

                    // Bad request: fail immediately
                    if status == 400 {
                        let msg = error_message(resp);
                        return Err(CliError {
                            code: exit_codes::EXIT_FETCH_VALIDATION,
                            message: format!("request rejected ({status}): {msg}"),
                            hint: None,
                        });
                    }

                    // Other 4xx (not 429): fail immediately
                    if (400..500).contains(&status) && status != 429 {
                        let msg = error_message(resp);
                        return Err(CliError {
                            code: exit_codes::EXIT_FETCH_UPSTREAM,
                            message: format!("fetch error ({status}): {msg}"),
                            hint: None,
                        });
                    }

                    // Retryable: 429, 5xx
                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let (code, what) = if status == 429 {
                                (exit_codes::EXIT_FETCH_RATE_LIMIT, "rate limited")
                            } else {
                                (exit_codes::EXIT_FETCH_UPSTREAM, "upstream error")
                            };
                            return Err(CliError {
                                code,
                                message: format!("{what} after {MAX_RETRIES} retries ({status})"),
                                hint: None,
                            });
                        }

                        // Respect Retry-After header for 429
                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .map(Duration::from_secs)
                                .unwrap_or(backoff)
                        } else {
                            backoff
                        };

                        log::warn!(
                            "retry {}/{} in {:?} (HTTP {})",
                            attempt + 1,
                            MAX_RETRIES,
                            wait,
                            status,
                        );
                        thread::sleep(wait);
                        backoff *= 2;
                        continue;
                    }

                    // Success: read as text first to tolerate a BOM
                    let text = resp.text().map_err(|e| CliError {
                        code: exit_codes::EXIT_FETCH_UPSTREAM,
                        message: format!("failed to read response body: {e}"),
                        hint: None,
                    })?;
                    let trimmed = text.trim_start_matches('\u{feff}');
                    return serde_json::from_str(trimmed).map_err(|e| CliError {
                        code: exit_codes::EXIT_FETCH_UPSTREAM,
                        message: format!(
                            "response is not JSON: {} (body: {})",
                            e,
                            trimmed.chars().take(200).collect::<String>(),
                        ),
                        hint: None,
                    });
                }
                Err(e) => {
                    // Network/timeout errors: retry
                    if attempt == MAX_RETRIES {
                        return Err(CliError {
                            code: exit_codes::EXIT_FETCH_UPSTREAM,
                            message: format!("request failed after {MAX_RETRIES} retries: {e}"),
                            hint: None,
                        });
                    }

                    log::warn!("retry {}/{} in {:?} ({})", attempt + 1, MAX_RETRIES, backoff, e);
                    thread::sleep(backoff);
                    backoff *= 2;
                }
            }
        }

        unreachable!()
    }
}

/// Best-effort error text from a failed response: a JSON `error` /
/// `message` field, else the start of the body.
fn error_message(resp: reqwest::blocking::Response) -> String {
    let text = resp.text().unwrap_or_default();
    let from_json = serde_json::from_str::<Value>(&text).ok().and_then(|body| {
        ["error", "message", "detail"]
            .iter()
            .find_map(|key| body.get(*key).and_then(Value::as_str).map(str::to_string))
    });
    from_json.unwrap_or_else(|| {
        let snippet: String = text.trim().chars().take(200).collect();
        if snippet.is_empty() { "no details".to_string() } else { snippet }
    })
}

// ── Shared helpers ──────────────────────────────────────────────────

/// Resolve the bearer token: flag value > environment variable > none.
/// An explicitly empty flag is an error.
pub fn resolve_token(flag: Option<String>, env_var: &str) -> Result<Option<String>, CliError> {
    if let Some(token) = flag {
        let trimmed = token.trim().to_string();
        if trimmed.is_empty() {
            return Err(CliError {
                code: exit_codes::EXIT_FETCH_EMPTY_TOKEN,
                message: format!("empty --token (omit it or set {env_var})"),
                hint: None,
            });
        }
        return Ok(Some(trimmed));
    }

    Ok(std::env::var(env_var)
        .ok()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

// ============================================================================
// fetch
// ============================================================================

pub fn cmd_fetch(
    config: Option<PathBuf>,
    url: String,
    token: Option<String>,
    format: Option<SourceSystem>,
    out: Option<PathBuf>,
    quiet: bool,
) -> Result<(), CliError> {
    let url = url.trim().to_string();
    if url.is_empty() {
        return Err(CliError::args("URL must not be empty"));
    }
    let token = resolve_token(token, TOKEN_ENV)?;
    let mut settings = load_settings(config.as_deref());

    if !quiet {
        eprintln!("Fetching {url}...");
    }
    let client = FetchClient::new()?;
    let body = client.get_json(&url, token.as_deref())?;

    let loaded = Loaded::Json(body);
    let normalized = normalize_loaded(&loaded, format, settings.sort)?;
    require_records(&normalized, &url)?;
    let out_label = write_csv(&normalized.records, out.as_deref())?;

    settings.push_recent_url(&url);
    remember(&settings, config.as_deref());

    if !quiet {
        eprintln!(
            "Fetched {} {} record(s) -> {}{}",
            normalized.records.len(),
            normalized.source,
            out_label,
            dropped_note(&normalized),
        );
    }
    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────
