//! `sellercheck validate` — parse a document, flag duplicates against the
//! previously known copy, cross-check against sellers.json directories.

use std::path::PathBuf;

use chrono::Duration;
use serde::Serialize;

use sellercheck_engine::model::{CrossCheckResults, Warning};
use sellercheck_engine::{
    check_against_cached, cross_check_records, parse_content, summarize, Entry, FetchStatus,
    ParseErrorCode, Relationship, ValidationSummary, VariableType,
};
use sellercheck_store::{DocumentKind, DocumentStore};

use crate::exit_codes::{EXIT_INVALID_RECORDS, EXIT_WARNINGS};
use crate::fetch::FetchClient;
use crate::providers::{CachedAdsTxtProvider, CachingDirectoryProvider};
use crate::CliError;

pub struct ValidateOptions {
    pub publisher_domain: Option<String>,
    pub offline: bool,
    pub no_crosscheck: bool,
    pub ttl: Duration,
    /// Test/mirror override for `https://<domain>`.
    pub base_url: Option<String>,
    pub quiet: bool,
}

/// Full annotated result, serialized by `--json`.
#[derive(Debug, Serialize)]
pub struct ValidationReport {
    pub publisher_domain: Option<String>,
    pub summary: ValidationSummary,
    pub entries: Vec<EntryReport>,
}

/// One entry, flattened for output.
#[derive(Debug, Serialize)]
pub struct EntryReport {
    pub kind: &'static str,
    pub line_number: i32,
    pub raw_line: String,
    pub is_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<Relationship>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certification_authority_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ParseErrorCode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<CrossCheckResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicate_domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variable_type: Option<VariableType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Run the whole validation pipeline over in-memory content. When a
/// publisher domain is given, the current content is stored afterwards as
/// the next run's "previously known" version.
pub fn run_validation(
    content: &str,
    store: &DocumentStore,
    options: &ValidateOptions,
) -> Result<ValidationReport, CliError> {
    let publisher = options.publisher_domain.as_deref();
    let mut entries = parse_content(content, publisher);

    if let Some(publisher) = publisher {
        let prior = CachedAdsTxtProvider { store };
        entries = check_against_cached(publisher, entries, &prior);

        if !options.no_crosscheck {
            let client = if options.offline {
                None
            } else {
                Some(FetchClient::new(options.quiet)?)
            };
            let directories = CachingDirectoryProvider {
                store,
                client: client.as_ref(),
                ttl: options.ttl,
                base_url: options.base_url.clone(),
            };
            entries = cross_check_records(Some(publisher), entries, &directories);
        }

        if let Err(e) = store.put(DocumentKind::AdsTxt, publisher, FetchStatus::Success, content) {
            if !options.quiet {
                eprintln!("warning: cache write failed: {e}");
            }
        }
    }

    let summary = summarize(&entries);
    Ok(ValidationReport {
        publisher_domain: publisher.map(str::to_string),
        summary,
        entries: entries.into_iter().map(entry_report).collect(),
    })
}

fn entry_report(entry: Entry) -> EntryReport {
    match entry {
        Entry::Record(r) => EntryReport {
            kind: "record",
            line_number: r.line_number,
            raw_line: r.raw_line.clone(),
            is_valid: r.is_valid(),
            domain: Some(r.domain),
            account_id: Some(r.account_id),
            relationship: r.relationship,
            certification_authority_id: r.certification_authority_id,
            error: r.error,
            warnings: r.warnings,
            validation: r.validation,
            duplicate_domain: r.duplicate_domain,
            variable_type: None,
            value: None,
        },
        Entry::Variable(v) => EntryReport {
            kind: "variable",
            line_number: v.line_number,
            raw_line: v.raw_line,
            is_valid: true,
            domain: None,
            account_id: None,
            relationship: None,
            certification_authority_id: None,
            error: None,
            warnings: Vec::new(),
            validation: None,
            duplicate_domain: None,
            variable_type: Some(v.variable_type),
            value: Some(v.value),
        },
    }
}

fn print_human(report: &ValidationReport) {
    let s = &report.summary;
    println!(
        "{}: {} record(s), {} variable(s), {} invalid, {} with warnings",
        report.publisher_domain.as_deref().unwrap_or("(no publisher domain)"),
        s.records,
        s.variables,
        s.invalid_records,
        s.records_with_warnings,
    );

    for entry in &report.entries {
        if let Some(code) = entry.error {
            println!("  line {}: error {} | {}", entry.line_number, code, entry.raw_line.trim());
        }
        for warning in &entry.warnings {
            println!(
                "  line {}: warning {} | {}",
                entry.line_number,
                warning.code,
                entry.raw_line.trim()
            );
        }
    }
}

pub fn cmd_validate(
    input: PathBuf,
    domain: Option<String>,
    json: bool,
    strict: bool,
    offline: bool,
    no_crosscheck: bool,
    cache_db: Option<PathBuf>,
    ttl_hours: i64,
    quiet: bool,
) -> Result<(), CliError> {
    let content = crate::read_input(&input)?;

    let path = cache_db.unwrap_or_else(DocumentStore::default_path);
    let store = match DocumentStore::open(&path) {
        Ok(store) => store,
        Err(e) => {
            // A broken cache downgrades the run, it does not block it.
            if !quiet {
                eprintln!("warning: cache unavailable ({e}); continuing without history");
            }
            DocumentStore::open_in_memory().map_err(|e| CliError::io(e.to_string()))?
        }
    };

    let options = ValidateOptions {
        publisher_domain: domain,
        offline,
        no_crosscheck,
        ttl: Duration::hours(ttl_hours),
        base_url: None,
        quiet,
    };
    let report = run_validation(&content, &store, &options)?;

    if json {
        let rendered = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("JSON serialization error: {e}")))?;
        println!("{rendered}");
    } else {
        print_human(&report);
    }

    if report.summary.invalid_records > 0 {
        return Err(CliError {
            code: EXIT_INVALID_RECORDS,
            message: format!("{} invalid record(s)", report.summary.invalid_records),
            hint: None,
        });
    }
    if strict && report.summary.records_with_warnings > 0 {
        return Err(CliError {
            code: EXIT_WARNINGS,
            message: format!(
                "{} record(s) with warnings (strict mode)",
                report.summary.records_with_warnings
            ),
            hint: None,
        });
    }

    Ok(())
}
