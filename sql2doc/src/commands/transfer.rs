use log::info;

use sql2doc::config::{Config, DestinationConfig, DestinationUri, SourceUri};
use sql2doc::destination::generic_stdout::GenericStdout;
use sql2doc::destination::mongodb::MongoDB;
use sql2doc::destination::Destination;
use sql2doc::resolver::WorkMode;
use sql2doc::source::firebird::Firebird;
use sql2doc::source::mssql::SqlServer;
use sql2doc::source::mysql::Mysql;
use sql2doc::source::Source;
use sql2doc::tasks::transfer::{TransferOptions, TransferTask};
use sql2doc::tasks::{Task, TransferReport, TransferResult};
use sql2doc::utils::{redact_uri, table};

use crate::cli::RunArgs;

/// Transfer every work unit of the configured source
pub fn run<F>(args: &RunArgs, config: Config, progress_callback: F) -> anyhow::Result<TransferReport>
where
    F: FnMut(usize, usize),
{
    let mode = config.source.work_mode();

    let mut options = TransferOptions::new(config.destination.collection.as_str());
    options.batch_size = match args.batch_size {
        Some(0) => anyhow::bail!("--batch-size must be greater than 0"),
        Some(batch_size) => batch_size,
        None => config.destination.batch_size()?,
    };

    info!(
        "transferring {} into collection '{}' by batches of {}",
        mode.describe(),
        options.collection,
        options.batch_size
    );

    match config.source.connection_uri()? {
        SourceUri::Mysql(uri) => {
            info!("source: mysql {}", redact_uri(uri.as_str()));
            with_destination(
                Mysql::new(uri),
                args,
                &config.destination,
                mode,
                options,
                progress_callback,
            )
        }
        SourceUri::SqlServer(connection_string) => {
            info!("source: sql server");
            with_destination(
                SqlServer::new(connection_string),
                args,
                &config.destination,
                mode,
                options,
                progress_callback,
            )
        }
        SourceUri::Firebird(uri) => {
            info!("source: firebird {}", redact_uri(uri.as_str()));
            with_destination(
                Firebird::new(uri),
                args,
                &config.destination,
                mode,
                options,
                progress_callback,
            )
        }
    }
}

fn with_destination<S, F>(
    source: S,
    args: &RunArgs,
    destination: &DestinationConfig,
    mode: WorkMode,
    options: TransferOptions,
    progress_callback: F,
) -> anyhow::Result<TransferReport>
where
    S: Source,
    F: FnMut(usize, usize),
{
    if args.output {
        return transfer(source, GenericStdout::new(), mode, options, progress_callback);
    }

    match destination.connection_uri()? {
        DestinationUri::MongoDB(uri) => transfer(
            source,
            MongoDB::new(uri, destination.database.clone()),
            mode,
            options,
            progress_callback,
        ),
    }
}

fn transfer<S, D, F>(
    source: S,
    destination: D,
    mode: WorkMode,
    options: TransferOptions,
    progress_callback: F,
) -> anyhow::Result<TransferReport>
where
    S: Source,
    D: Destination,
    F: FnMut(usize, usize),
{
    let mut task = TransferTask::new(source, destination, mode, options);
    let report = task.run(progress_callback)?;
    Ok(report)
}

/// Display the outcome of each work unit
pub fn summary(report: &TransferReport) {
    if report.units.is_empty() {
        println!("<empty> no work units transferred\n");
        return;
    }

    let mut table = table();
    table.set_titles(row!["unit", "status", "documents", "error"]);

    for (name, result) in &report.units {
        let (status, error) = match result {
            TransferResult::Success(_) => ("ok", String::new()),
            TransferResult::SourceQueryFailed(err) => ("query failed", err.to_string()),
            TransferResult::SinkWriteFailed(err, _) => ("write failed", err.to_string()),
        };

        table.add_row(row![name, status, result.written(), error]);
    }

    let _ = table.printstd();

    println!(
        "\n{} unit(s) succeeded, {} failed, {} document(s) written",
        report.successes(),
        report.failures(),
        report.documents_written()
    );
}
