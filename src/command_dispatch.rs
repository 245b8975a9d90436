//! Purpose: Execute parsed CLI commands against the packing engine.
//! Role: Keeps `main` focused on argument parsing and error emission.
//! Invariants: A record is validated completely before any of its values are packed.
//! Invariants: Stdout carries only the matrix payload; diagnostics go to stderr.
use std::fs::File;
use std::io::{self, Read, Write};
use std::sync::Arc;

use clap::CommandFactory;
use rowpack::api::{Error, ErrorKind, Field, FieldDomain, RowState, Storage, StorageOptions};
use serde_json::{Map, Value, json};

use crate::ingest::{ErrorPolicy, IngestConfig, ingest};
use crate::matrix_json::{matrix_json, row_json};
use crate::notice::Notice;
use crate::{
    Cli, ColorMode, Command, ErrorPolicyArg, OutputFormat, PackArgs, PackMode, RunOutcome,
    emit_notice,
};

const MAX_REPORTED_LINES: usize = 20;

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Pack(args) => run_pack(args, color_mode),
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "rowpack", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            let value = json!({
                "name": env!("CARGO_PKG_NAME"),
                "version": env!("CARGO_PKG_VERSION"),
            });
            println!("{value}");
            Ok(RunOutcome::ok())
        }
    }
}

fn run_pack(args: PackArgs, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    let domain_names = if args.domain.is_empty() {
        args.columns.clone()
    } else {
        args.domain.clone()
    };
    let capacity = row_count(args.capacity, "--capacity", ErrorKind::Config)?;
    let discard_head = row_count(args.discard_head, "--discard-head", ErrorKind::Range)?;
    let discard_tail = row_count(args.discard_tail, "--discard-tail", ErrorKind::Range)?;
    let domain = FieldDomain::new(domain_names)?;
    let schema = Arc::new(domain.schema(&args.columns)?);
    let options = StorageOptions::new(capacity).with_byte_order(args.byte_order.into());
    let mut storage = Storage::new(schema, options)?;

    let reader: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message(format!("failed to open {}", path.display()))
                .with_source(err)
        })?),
        None => Box::new(io::stdin().lock()),
    };
    let policy = match args.errors {
        ErrorPolicyArg::Stop => ErrorPolicy::Stop,
        ErrorPolicyArg::Skip => ErrorPolicy::Skip,
    };

    let mut skipped_lines = Vec::new();
    let outcome = ingest(
        reader,
        IngestConfig::new(policy),
        |record| pack_record(&mut storage, &domain, args.mode, record),
        |failure| {
            tracing::debug!(
                line = failure.line,
                kind = %failure.error_kind,
                snippet = failure.snippet.as_deref().unwrap_or_default(),
                "skipped record: {}",
                failure.message
            );
            if skipped_lines.len() < MAX_REPORTED_LINES {
                skipped_lines.push(failure.line);
            }
        },
    )?;
    tracing::info!(
        records = outcome.ok,
        failed = outcome.failed,
        rows = storage.committed_rows(),
        "packed records"
    );

    if outcome.failed > 0 {
        let notice = Notice::new(
            "skipped",
            "pack",
            format!("skipped {} of {} records", outcome.failed, outcome.records_total),
        )
        .with_detail("failed", outcome.failed)
        .with_detail("lines", skipped_lines);
        emit_notice(&notice, color_mode);
    }
    if storage.active_state() == RowState::Partial {
        let missing: Vec<&str> = storage
            .missing_columns()
            .map(|field| domain.name(field).unwrap_or_default())
            .collect();
        let notice = Notice::new("partial_row", "pack", "input ended inside a row; it was dropped")
            .with_detail("missing", missing);
        emit_notice(&notice, color_mode);
    }

    storage.discard(discard_head, discard_tail)?;
    emit_matrix(&storage, &domain, args.format)?;
    Ok(RunOutcome::ok())
}

fn row_count(value: i64, flag: &str, kind: ErrorKind) -> Result<usize, Error> {
    usize::try_from(value).map_err(|_| {
        Error::new(kind)
            .with_message(format!("{flag} must not be negative (got {value})"))
    })
}

fn pack_record(
    storage: &mut Storage<Field>,
    domain: &FieldDomain,
    mode: PackMode,
    record: &Map<String, Value>,
) -> Result<(), Error> {
    let mut values = Vec::with_capacity(record.len());
    for (key, value) in record {
        let Some(field) = domain.field(key) else {
            continue;
        };
        if !storage.schema().contains(field) {
            continue;
        }
        let number = value.as_f64().ok_or_else(|| {
            Error::new(ErrorKind::Usage)
                .with_message("value is not a number")
                .with_column(key.as_str())
        })?;
        values.push((field, number));
    }

    match mode {
        PackMode::Row => storage.pack_row(values.as_slice()),
        PackMode::Field => {
            for (field, number) in values {
                storage.pack(field, number)?;
            }
            Ok(())
        }
    }
}

fn emit_matrix(
    storage: &Storage<Field>,
    domain: &FieldDomain,
    format: OutputFormat,
) -> Result<(), Error> {
    let view = storage.view();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = match format {
        OutputFormat::Json => writeln!(out, "{}", matrix_json(storage, domain, view)),
        OutputFormat::Jsonl => view
            .iter_rows()
            .try_for_each(|row| writeln!(out, "{}", row_json(row))),
        OutputFormat::Raw => out.write_all(view.as_bytes()),
    };
    result.and_then(|()| out.flush()).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to write output")
            .with_source(err)
    })
}
