use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use warehouse_recon::{
    config,
    diagnostics::{Diagnostic, ReportContext},
    metrics,
    models::{sort_rows, RowOrder},
    repositories::InMemoryStore,
    services::reports::{ReportBatchDriver, ReportWindow},
};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_HASH"),
    ", built ",
    env!("BUILD_TIME"),
    ")"
);

#[derive(Parser)]
#[command(
    name = "lot-report",
    about = "Reconciled lot balances for an inward date window",
    version,
    long_version = LONG_VERSION
)]
struct Cli {
    #[arg(long, help = "JSON dataset with inward, releaseOrders, deliveryOrders, ... arrays")]
    data: PathBuf,
    #[arg(long, help = "First inward date (YYYY-MM-DD)")]
    start: NaiveDate,
    #[arg(long, help = "Last inward date, inclusive (YYYY-MM-DD)")]
    end: NaiveDate,
    #[arg(long, help = "Maximum lots to report, bounded by configuration")]
    max_rows: Option<usize>,
    #[arg(long, value_enum, default_value_t = SortArg::Asc)]
    sort: SortArg,
    #[arg(
        long,
        action = ArgAction::SetTrue,
        help = "Print Prometheus metrics to stderr after the report"
    )]
    metrics: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
    None,
}

impl SortArg {
    fn order(self) -> Option<RowOrder> {
        match self {
            SortArg::Asc => Some(RowOrder::InwardDateAsc),
            SortArg::Desc => Some(RowOrder::InwardDateDesc),
            SortArg::None => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::load_config().context("failed to load configuration")?;
    config::init_tracing(config.log_level(), config.log_json);

    let store = InMemoryStore::from_path(&cli.data)
        .with_context(|| format!("failed to load dataset {}", cli.data.display()))?;
    let driver = ReportBatchDriver::from_config(Arc::new(store), &config);

    let mut window = ReportWindow::from_dates(cli.start, cli.end);
    if let Some(max_rows) = cli.max_rows {
        window = window.with_max_rows(max_rows);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling report");
            on_interrupt.cancel();
        }
    });

    let ctx = ReportContext::new();
    let mut rows = driver
        .run(&window, &ctx, &cancel)
        .await
        .context("report failed")?;
    if let Some(order) = cli.sort.order() {
        sort_rows(&mut rows, order);
    }

    print_json(&rows)?;
    render_summary(rows.len(), &ctx);
    if cli.metrics {
        eprint!("{}", metrics::gather_text());
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_summary(rows: usize, ctx: &ReportContext) {
    let diagnostics = ctx.diagnostics();
    eprintln!(
        "request {} • {} rows • {} skipped • {} degraded lookups",
        ctx.request_id(),
        rows,
        ctx.skipped().len(),
        ctx.degraded_lookups()
    );
    for diagnostic in diagnostics {
        match diagnostic {
            Diagnostic::SkippedRecord { record_id, reason } => eprintln!(
                "- skipped {}: {}",
                record_id.as_deref().unwrap_or("<no id>"),
                reason
            ),
            Diagnostic::LookupDegraded {
                record_id,
                collection,
                failure,
            } => eprintln!("- {} lookup for {} degraded: {}", collection, record_id, failure),
        }
    }
}
