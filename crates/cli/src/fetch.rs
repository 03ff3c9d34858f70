//! `sellercheck fetch` — pull supply-chain documents over HTTPS with
//! retry/backoff, and keep the local cache warm.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Subcommand;

use sellercheck_engine::FetchStatus;
use sellercheck_store::{DocumentKind, DocumentStore};

use crate::exit_codes::{EXIT_FETCH_NOT_FOUND, EXIT_FETCH_RATE_LIMIT, EXIT_FETCH_UPSTREAM};
use crate::CliError;

const MAX_RETRIES: u32 = 3;
const REQUEST_TIMEOUT_SECS: u64 = 15;
const USER_AGENT: &str = concat!("sellercheck/", env!("CARGO_PKG_VERSION"));

/// HTTP client shared by the fetch command and the validate providers:
/// retry with exponential backoff, Retry-After honored on 429, immediate
/// failure on other 4xx. Progress notes go to stderr unless quiet.
pub struct FetchClient {
    http: reqwest::blocking::Client,
    quiet: bool,
}

impl FetchClient {
    pub fn new(quiet: bool) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: EXIT_FETCH_UPSTREAM,
                message: format!("failed to build HTTP client: {e}"),
                hint: None,
            })?;
        Ok(Self { http, quiet })
    }

    /// Fetch one document for `domain`. The well-known path is derived
    /// from `kind`; `base_url` overrides `https://<domain>` (tests and
    /// mirrors). A 404/410 is a terminal NotFound, not an error.
    pub fn fetch_document(
        &self,
        kind: DocumentKind,
        domain: &str,
        base_url: Option<&str>,
    ) -> Result<(FetchStatus, String), CliError> {
        let path = match kind {
            DocumentKind::AdsTxt => "ads.txt",
            DocumentKind::SellersJson => "sellers.json",
        };
        let base = match base_url {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://{}", domain.trim().to_ascii_lowercase()),
        };
        let url = format!("{base}/{path}");
        url::Url::parse(&url)
            .map_err(|e| CliError::args(format!("invalid URL {url}: {e}")))?;

        if !self.quiet {
            eprintln!("Fetching {url}...");
        }

        let mut backoff_secs = 1u64;
        for attempt in 0..=MAX_RETRIES {
            let result = self.http.get(&url).send();

            match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if status == 404 || status == 410 {
                        return Ok((FetchStatus::NotFound, String::new()));
                    }

                    if (400..500).contains(&status) && status != 429 {
                        return Err(CliError {
                            code: EXIT_FETCH_UPSTREAM,
                            message: format!("{domain} rejected the request (HTTP {status})"),
                            hint: None,
                        });
                    }

                    if status == 429 || status >= 500 {
                        if attempt == MAX_RETRIES {
                            let code = if status == 429 {
                                EXIT_FETCH_RATE_LIMIT
                            } else {
                                EXIT_FETCH_UPSTREAM
                            };
                            return Err(CliError {
                                code,
                                message: format!(
                                    "{domain} failed after {MAX_RETRIES} attempts (HTTP {status})"
                                ),
                                hint: None,
                            });
                        }

                        let wait = if status == 429 {
                            resp.headers()
                                .get("retry-after")
                                .and_then(|v| v.to_str().ok())
                                .and_then(|v| v.parse::<u64>().ok())
                                .unwrap_or(backoff_secs)
                        } else {
                            backoff_secs
                        };

                        if !self.quiet {
                            eprintln!(
                                "warning: retry {}/{} in {}s (HTTP {})",
                                attempt + 1,
                                MAX_RETRIES,
                                wait,
                                status,
                            );
                        }
                        thread::sleep(Duration::from_secs(wait));
                        backoff_secs *= 2;
                        continue;
                    }

                    let text = resp.text().map_err(|e| CliError {
                        code: EXIT_FETCH_UPSTREAM,
                        message: format!("failed to read {domain} response body: {e}"),
                        hint: None,
                    })?;
                    // Tolerate BOM-prefixed documents.
                    let text = text.trim_start_matches('\u{feff}').to_string();
                    return Ok((FetchStatus::Success, text));
                }
                Err(e) => {
                    if attempt == MAX_RETRIES {
                        return Err(CliError {
                            code: EXIT_FETCH_UPSTREAM,
                            message: format!(
                                "{domain} unreachable after {MAX_RETRIES} attempts: {e}"
                            ),
                            hint: None,
                        });
                    }

                    if !self.quiet {
                        eprintln!(
                            "warning: retry {}/{} in {}s ({})",
                            attempt + 1,
                            MAX_RETRIES,
                            backoff_secs,
                            e,
                        );
                    }
                    thread::sleep(Duration::from_secs(backoff_secs));
                    backoff_secs *= 2;
                }
            }
        }

        unreachable!()
    }
}

#[derive(Subcommand)]
pub enum FetchCommands {
    /// Fetch a publisher's ads.txt
    #[command(after_help = "\
Examples:
  sellercheck fetch adstxt pub.example.com
  sellercheck fetch adstxt pub.example.com --out ads.txt --no-cache")]
    Adstxt {
        /// Publisher domain
        domain: String,

        /// Output file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Skip writing the result into the local cache
        #[arg(long)]
        no_cache: bool,

        /// Cache database path (default: the per-user data dir)
        #[arg(long)]
        cache_db: Option<PathBuf>,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// Fetch an advertising system's sellers.json
    #[command(after_help = "\
Examples:
  sellercheck fetch sellers openx.com
  sellercheck fetch sellers openx.com --out sellers.json")]
    Sellers {
        /// Advertising-system domain
        domain: String,

        /// Output file path (default: stdout)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Skip writing the result into the local cache
        #[arg(long)]
        no_cache: bool,

        /// Cache database path (default: the per-user data dir)
        #[arg(long)]
        cache_db: Option<PathBuf>,

        /// Suppress progress on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },
}

pub fn cmd_fetch(cmd: FetchCommands) -> Result<(), CliError> {
    let (kind, domain, out, no_cache, cache_db, quiet) = match cmd {
        FetchCommands::Adstxt { domain, out, no_cache, cache_db, quiet } => {
            (DocumentKind::AdsTxt, domain, out, no_cache, cache_db, quiet)
        }
        FetchCommands::Sellers { domain, out, no_cache, cache_db, quiet } => {
            (DocumentKind::SellersJson, domain, out, no_cache, cache_db, quiet)
        }
    };

    let client = FetchClient::new(quiet)?;
    let (status, content) = client.fetch_document(kind, &domain, None)?;

    if !no_cache {
        let path = cache_db.unwrap_or_else(DocumentStore::default_path);
        match DocumentStore::open(&path) {
            Ok(store) => {
                if let Err(e) = store.put(kind, &domain, status, &content) {
                    if !quiet {
                        eprintln!("warning: cache write failed: {e}");
                    }
                }
            }
            Err(e) => {
                if !quiet {
                    eprintln!("warning: cache unavailable: {e}");
                }
            }
        }
    }

    if status == FetchStatus::NotFound {
        return Err(CliError {
            code: EXIT_FETCH_NOT_FOUND,
            message: format!("{domain} publishes no {}", match kind {
                DocumentKind::AdsTxt => "ads.txt",
                DocumentKind::SellersJson => "sellers.json",
            }),
            hint: None,
        });
    }

    crate::write_output(&content, &out)?;
    if !quiet {
        if let Some(path) = &out {
            eprintln!("Wrote {} bytes to {}", content.len(), path.display());
        }
    }

    Ok(())
}
