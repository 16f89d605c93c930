use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use ledger_report::clock::{Clock, SystemClock};
use ledger_report::config::{config_dir, load_config, resolve_output_dir, Config, CONFIG_TEMPLATE};
use ledger_report::error::{ReportError, Result};
use ledger_report::report::{
    aggregate, monthly_revenue, top_customers, top_products, ReportColumn, ReportFetcher,
    ReportMetrics, ReportRow, ReportTable, RevenueShare, SearchRequest,
};
use ledger_report::store::{check_connection, PgLedgerStore};
use ledger_report::xlsx::{report_file_name, write_report, ExportOptions, XLSX_MIME};

#[derive(Parser)]
#[command(name = "ledger-report")]
#[command(version, about = "Sales ledger search and spreadsheet reporting", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.ledger-report or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// Verify the ledger store can be reached with the configured credentials
    Check,

    /// Search the sales ledger by product, customer or document number
    Search {
        /// Search term (empty lists every sale in the window)
        term: Option<String>,

        /// Years of history to search (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=15))]
        years: Option<i64>,

        /// Number of rows to show (default: all)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Also show top products, top customers and the monthly trend
        #[arg(long)]
        insights: bool,

        /// Print rows and metrics as JSON
        #[arg(long)]
        json: bool,

        /// Also write the xlsx report to the output directory
        #[arg(long)]
        export: bool,
    },

    /// Export a search as a formatted xlsx report
    Export {
        /// Search term (empty exports every sale in the window)
        term: Option<String>,

        /// Years of history to search (default from config)
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..=15))]
        years: Option<i64>,

        /// Custom output file path (default: output_dir/<prefix>_report_<date>.xlsx)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Columns to export, comma separated (default: all)
        #[arg(long, value_delimiter = ',', value_name = "COLUMN")]
        columns: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "ledger_report=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // A missing .env is fine; variables may come from the environment.
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            warn!(error = %e, "ignoring unreadable .env file");
        }
    }

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Check => cmd_check(&cfg_dir).await,
        Commands::Search {
            term,
            years,
            limit,
            insights,
            json,
            export,
        } => {
            let opts = SearchOptions {
                limit,
                insights,
                json,
                export,
            };
            cmd_search(&cfg_dir, term.unwrap_or_default(), years, opts).await
        }
        Commands::Export {
            term,
            years,
            output,
            columns,
        } => cmd_export(&cfg_dir, term.unwrap_or_default(), years, output, &columns).await,
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(ReportError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::create_dir_all(cfg_dir.join("output"))?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized ledger-report config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Point it at your ledger:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Provide the secret:       export PG_PASSWORD=... (or put it in .env)");
    println!("  3. Verify the connection:    ledger-report check");
    println!();
    println!("Then search:");
    println!("  ledger-report search \"<product, customer or document>\"");

    Ok(())
}

/// Load config.toml and apply PG_* overrides.
fn load_settings(cfg_dir: &Path) -> Result<Config> {
    let mut config = load_config(cfg_dir)?;
    config.apply_env()?;
    Ok(config)
}

async fn cmd_check(cfg_dir: &Path) -> Result<()> {
    let config = load_settings(cfg_dir)?;
    let credentials = config.store.credentials()?;

    check_connection(&credentials).await?;

    println!(
        "Connected to {}@{}:{}/{}",
        credentials.user, credentials.host, credentials.port, credentials.database
    );
    Ok(())
}

/// Build a fetcher over the configured store. Fails fast on a missing secret.
fn fetcher_for(config: &Config) -> Result<ReportFetcher<PgLedgerStore>> {
    let credentials = config.store.credentials()?;
    Ok(ReportFetcher::new(
        PgLedgerStore::new(credentials),
        Arc::new(SystemClock),
        config.report.cache_ttl(),
    ))
}

fn search_request(config: &Config, term: String, years: Option<i64>) -> Result<SearchRequest> {
    let years = years.unwrap_or(i64::from(config.report.default_years));
    SearchRequest::new(term, years)
}

// Table row struct for tabled
#[derive(Tabled)]
struct LedgerRow {
    #[tabled(rename = "FECHA")]
    date: String,
    #[tabled(rename = "PRODUCTO")]
    product: String,
    #[tabled(rename = "CLIENTE")]
    customer: String,
    #[tabled(rename = "CANT.")]
    quantity: String,
    #[tabled(rename = "PRECIO")]
    unit_price: String,
    #[tabled(rename = "IMPORTE")]
    total: String,
    #[tabled(rename = "Nº DOC")]
    document: String,
    #[tabled(rename = "ALMACÉN")]
    warehouse: String,
    #[tabled(rename = "FACTURA")]
    invoice: String,
}

impl LedgerRow {
    fn new(row: &ReportRow, symbol: &str) -> Self {
        Self {
            date: row.date.format("%d/%m/%Y").to_string(),
            product: row.product_name.clone(),
            customer: row.customer_name.clone().unwrap_or_default(),
            quantity: format_quantity(row.quantity),
            unit_price: format_money(row.unit_price, symbol),
            total: format_money(row.line_total, symbol),
            document: row.document_number.clone(),
            warehouse: row.warehouse_name.clone().unwrap_or_default(),
            invoice: row.invoice_link.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct ShareRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "NOMBRE")]
    name: String,
    #[tabled(rename = "IMPORTE")]
    revenue: String,
}

#[derive(Tabled)]
struct MonthRow {
    #[tabled(rename = "MES")]
    month: String,
    #[tabled(rename = "IMPORTE")]
    revenue: String,
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    term: &'a str,
    years: u32,
    metrics: ReportMetrics,
    rows: &'a [ReportRow],
}

struct SearchOptions {
    limit: Option<usize>,
    insights: bool,
    json: bool,
    export: bool,
}

async fn cmd_search(
    cfg_dir: &Path,
    term: String,
    years: Option<i64>,
    opts: SearchOptions,
) -> Result<()> {
    let config = load_settings(cfg_dir)?;
    let request = search_request(&config, term, years)?;
    let fetcher = fetcher_for(&config)?;
    let symbol = config.report.currency_symbol.as_str();

    let table = fetcher.fetch(&request).await;
    let metrics = aggregate(&table);

    if opts.json {
        let output = SearchOutput {
            term: request.term(),
            years: request.lookback_years(),
            metrics,
            rows: table.rows(),
        };
        let content = serde_json::to_string_pretty(&output).map_err(|e| {
            ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
        })?;
        println!("{content}");
        return Ok(());
    }

    if table.is_empty() {
        println!("No se encontraron resultados");
        println!("Intenta con otros términos o ajusta el rango de años (--years).");
        return Ok(());
    }

    print_metrics(&metrics, symbol);
    println!();

    let shown = opts.limit.unwrap_or(table.len()).min(table.len());
    let rows: Vec<LedgerRow> = table
        .iter()
        .take(shown)
        .map(|r| LedgerRow::new(r, symbol))
        .collect();
    println!("{}", Table::new(rows).with(Style::rounded()).to_string());
    if shown < table.len() {
        println!("Showing {} of {} rows.", shown, table.len());
    }

    if opts.insights {
        print_insights(&table, symbol);
    }

    if opts.export {
        let path = default_report_path(&config, cfg_dir);
        save_report(&table, &config, &[], &path)?;
    }

    Ok(())
}

fn print_metrics(metrics: &ReportMetrics, symbol: &str) {
    println!("Revenue Total:       {}", format_money(metrics.total_revenue, symbol));
    println!("Volumen Unidades:    {}", format_quantity(metrics.total_quantity));
    println!("Frecuencia Pedidos:  {}", metrics.order_count);
    println!(
        "Precio Promedio:     {}",
        format_money(metrics.average_unit_price, symbol)
    );
}

fn print_insights(table: &ReportTable, symbol: &str) {
    let share_table = |shares: Vec<RevenueShare>| {
        let rows: Vec<ShareRow> = shares
            .into_iter()
            .enumerate()
            .map(|(i, s)| ShareRow {
                index: i + 1,
                name: s.name,
                revenue: format_money(s.revenue, symbol),
            })
            .collect();
        Table::new(rows).with(Style::rounded()).to_string()
    };

    println!();
    println!("Top productos");
    println!("{}", share_table(top_products(table, 10)));

    println!();
    println!("Top clientes");
    println!("{}", share_table(top_customers(table, 15)));

    let months: Vec<MonthRow> = monthly_revenue(table)
        .into_iter()
        .map(|m| MonthRow {
            month: m.month_end.format("%Y-%m").to_string(),
            revenue: format_money(m.revenue, symbol),
        })
        .collect();
    println!();
    println!("Tendencia mensual");
    println!("{}", Table::new(months).with(Style::rounded()).to_string());
}

async fn cmd_export(
    cfg_dir: &Path,
    term: String,
    years: Option<i64>,
    output: Option<PathBuf>,
    columns: &[String],
) -> Result<()> {
    let columns = columns
        .iter()
        .map(|c| c.parse())
        .collect::<Result<Vec<ReportColumn>>>()?;

    let config = load_settings(cfg_dir)?;
    let request = search_request(&config, term, years)?;
    let fetcher = fetcher_for(&config)?;

    let table = fetcher.fetch(&request).await;

    let path = output.unwrap_or_else(|| default_report_path(&config, cfg_dir));
    save_report(&table, &config, &columns, &path)?;

    Ok(())
}

fn default_report_path(config: &Config, cfg_dir: &Path) -> PathBuf {
    let today = SystemClock.today();
    resolve_output_dir(&config.report.output_dir, cfg_dir)
        .join(report_file_name(&config.report.file_prefix, today))
}

fn save_report(
    table: &ReportTable,
    config: &Config,
    columns: &[ReportColumn],
    path: &Path,
) -> Result<()> {
    let mut options = ExportOptions::new(SystemClock.today())
        .with_currency_symbol(config.report.currency_symbol.clone());
    if !columns.is_empty() {
        options = options.with_columns(columns.to_vec());
    }

    write_report(table, &options, path)?;

    let total = aggregate(table).total_revenue;
    println!("Exported {} row(s)", table.len());
    println!(
        "  Total:  {}",
        format_money(total, &config.report.currency_symbol)
    );
    println!("  Saved:  {}", path.display());
    println!("  Type:   {XLSX_MIME}");
    Ok(())
}

fn format_quantity(value: f64) -> String {
    format_grouped_int(value.round() as i64)
}

fn format_money(value: f64, currency_symbol: &str) -> String {
    format!("{} {}", currency_symbol, format_report_amount(value))
}

fn format_grouped_int(value: i64) -> String {
    let negative = value < 0;
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, ch) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }

    let mut grouped: String = out.chars().rev().collect();
    if negative {
        grouped.insert(0, '-');
    }
    grouped
}

/// Format a money amount with two decimal places and thousands separators
fn format_report_amount(value: f64) -> String {
    // Amounts that round to zero print unsigned.
    let value = if value.abs() < 0.005 { 0.0 } else { value };
    let rounded = format!("{:.2}", value);
    let (whole, frac) = rounded.split_once('.').unwrap_or((rounded.as_str(), "00"));

    // Group digits in the whole part
    let negative = whole.starts_with('-');
    let digits = whole.trim_start_matches('-');
    let grouped = format_grouped_int(digits.parse::<i64>().unwrap_or(0));

    if negative {
        format!("-{}.{}", grouped, frac)
    } else {
        format!("{}.{}", grouped, frac)
    }
}
