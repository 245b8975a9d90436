//! Purpose: Read JSON-lines records for `rowpack pack` with an explicit failure policy.
//! Exports: `ErrorPolicy`, `IngestConfig`, `IngestOutcome`, `IngestFailure`, `ingest`.
//! Role: Input engine used by the CLI; isolates line framing and skip rules from packing.
//! Invariants: Skip mode continues only at line boundaries and only for per-record faults.
//! Invariants: No unbounded buffering; a single record is capped at `max_record_bytes`.
use std::io::{self, BufRead, BufReader, Read};

use bstr::ByteSlice;
use rowpack::api::{Error, ErrorKind};
use serde_json::{Map, Value};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Stop,
    Skip,
}

#[derive(Copy, Clone, Debug)]
pub struct IngestConfig {
    pub errors: ErrorPolicy,
    pub max_record_bytes: usize,
    pub max_snippet_bytes: usize,
}

impl IngestConfig {
    pub fn new(errors: ErrorPolicy) -> Self {
        Self {
            errors,
            max_record_bytes: 1024 * 1024,
            max_snippet_bytes: 120,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct IngestOutcome {
    pub records_total: u64,
    pub ok: u64,
    pub failed: u64,
}

#[derive(Clone, Debug)]
pub struct IngestFailure {
    pub line: u64,
    pub message: String,
    pub error_kind: String,
    pub snippet: Option<String>,
}

fn io_error(err: io::Error, message: &str) -> Error {
    Error::new(ErrorKind::Io)
        .with_message(message)
        .with_source(err)
}

/// Faults confined to one record; anything else (full storage, I/O) always stops ingest.
fn is_record_fault(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::Usage | ErrorKind::MissingValue)
}

pub fn ingest<R, F, N>(
    reader: R,
    config: IngestConfig,
    mut on_record: F,
    mut on_failure: N,
) -> Result<IngestOutcome, Error>
where
    R: Read,
    F: FnMut(&Map<String, Value>) -> Result<(), Error>,
    N: FnMut(IngestFailure),
{
    let mut outcome = IngestOutcome::default();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    let mut line_no = 0u64;

    loop {
        buf.clear();
        let read = reader
            .by_ref()
            .take(config.max_record_bytes as u64 + 1)
            .read_until(b'\n', &mut buf)
            .map_err(|err| io_error(err, "failed to read input"))?;
        if read == 0 {
            break;
        }
        line_no += 1;
        if buf.len() > config.max_record_bytes && !buf.ends_with(b"\n") {
            return Err(Error::new(ErrorKind::Usage)
                .with_message(format!(
                    "record exceeds {} bytes",
                    config.max_record_bytes
                ))
                .with_line(line_no));
        }
        let record = buf.trim();
        if record.is_empty() {
            continue;
        }

        let result = parse_record(record).and_then(|map| on_record(&map));
        match result {
            Ok(()) => outcome.ok += 1,
            Err(err) if config.errors == ErrorPolicy::Skip && is_record_fault(err.kind()) => {
                outcome.failed += 1;
                on_failure(IngestFailure {
                    line: line_no,
                    message: err.message().unwrap_or("invalid record").to_string(),
                    error_kind: format!("{:?}", err.kind()),
                    snippet: Some(snippet(record, config.max_snippet_bytes)),
                });
            }
            Err(err) => {
                let err = err.with_line(line_no);
                return Err(if is_record_fault(err.kind()) {
                    err.with_hint("Use --errors skip to continue past bad records.")
                } else {
                    err
                });
            }
        }
    }

    outcome.records_total = outcome.ok + outcome.failed;
    Ok(outcome)
}

fn parse_record(record: &[u8]) -> Result<Map<String, Value>, Error> {
    match serde_json::from_slice::<Value>(record) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(Error::new(ErrorKind::Usage).with_message("record is not a JSON object")),
        Err(err) => Err(Error::new(ErrorKind::Usage)
            .with_message(format!("invalid JSON: {err}"))
            .with_source(err)),
    }
}

fn snippet(record: &[u8], max_bytes: usize) -> String {
    let text = record.to_str_lossy();
    if text.len() <= max_bytes {
        return text.into_owned();
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}
