//! CLI binary for catalog-ocr.
//!
//! A thin shim over the library crate that maps flags and environment
//! variables to `PipelineConfig` and prints results.

use anyhow::{Context, Result};
use catalog_ocr::config::{DEFAULT_ENDPOINT, DEFAULT_OUTPUT_ROOT};
use catalog_ocr::pipeline::input::source_path;
use catalog_ocr::pipeline::persist::format_page_summary;
use catalog_ocr::{
    extract_document, process_pdf_by_pages, ClientConfig, ExtractionProgressCallback, PageResult,
    PdfiumSplitter, PipelineConfig, ProgressCallback, RunReport,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per page.
/// Pages finish out of order, so per-page timings are keyed by page number.
struct CliProgressCallback {
    bar: ProgressBar,
    start_times: Mutex<HashMap<usize, Instant>>,
    products: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` reports the page count.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Splitting PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            start_times: Mutex::new(HashMap::new()),
            products: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Extracting");
        self.bar.reset_eta();
    }

    fn elapsed_secs(&self, page_num: usize) -> f64 {
        self.start_times
            .lock()
            .ok()
            .and_then(|mut times| times.remove(&page_num))
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl ExtractionProgressCallback for CliProgressCallback {
    fn on_run_start(&self, total_pages: usize) {
        self.activate_bar(total_pages);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Extracting products from {total_pages} pages…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        if let Ok(mut times) = self.start_times.lock() {
            times.insert(page_num, Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, product_count: usize) {
        let elapsed = self.elapsed_secs(page_num);
        self.products.fetch_add(product_count, Ordering::SeqCst);

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {:<12}  {}",
            green("✓"),
            page_num,
            total,
            dim(&format!("{product_count:>3} products")),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: usize, total: usize, error: &str) {
        let elapsed = self.elapsed_secs(page_num);

        let msg = match error.char_indices().nth(79) {
            Some((idx, _)) => format!("{}\u{2026}", &error[..idx]),
            None => error.to_string(),
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg),
            dim(&format!("{elapsed:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_run_complete(&self, total_pages: usize, success_count: usize) {
        let failed = total_pages.saturating_sub(success_count);
        self.bar.finish_and_clear();

        let products = self.products.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} pages extracted, {} products",
                green("✔"),
                bold(&success_count.to_string()),
                bold(&products.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages extracted, {} products  ({} failed)",
                if failed == total_pages {
                    red("✘")
                } else {
                    cyan("⚠")
                },
                bold(&success_count.to_string()),
                total_pages,
                bold(&products.to_string()),
                red(&failed.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract a catalog, 4 pages at a time
  catalog-ocr sampledata/spring-catalog.pdf

  # Same, configured from the environment
  BASE_PDF_PATH=sampledata PDF_NAME=spring-catalog.pdf catalog-ocr

  # Slower connection: 2 pages at a time
  catalog-ocr --workers 2 catalog.pdf

  # Single request for the whole document, nothing written to disk
  catalog-ocr --whole-document catalog.pdf

  # Combined report as JSON on stdout
  catalog-ocr --json catalog.pdf > products.json

OUTPUT LAYOUT:
  output/
  └── YYYYMMDD-HHMMSS-<name>/
      ├── 001/
      │   ├── result.json
      │   └── summary.txt
      ├── 002/
      │   └── ...
      ├── processing_summary.txt
      └── combined_results.json

ENVIRONMENT VARIABLES:
  VISION_AGENT_API_KEY    Extraction service credential (required)
  BASE_PDF_PATH           Directory containing the PDF
  PDF_NAME                PDF file name inside BASE_PDF_PATH
  CATALOG_OCR_WORKERS     Pages extracted concurrently (default 4)
  CATALOG_OCR_OUTPUT      Output root directory (default ./output)
  CATALOG_OCR_ENDPOINT    Override the extraction endpoint URL
  CATALOG_OCR_SCHEMA      JSON Schema file replacing the built-in product schema
  PDFIUM_LIB_PATH         Path to an existing libpdfium (skips auto-download)
"#;

/// Extract product records from scanned PDF catalogs.
#[derive(clap::Parser, Debug)]
#[command(
    name = "catalog-ocr",
    version,
    about = "Extract product records from scanned PDF catalogs, page by page",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF to process. Defaults to BASE_PDF_PATH/PDF_NAME.
    input: Option<PathBuf>,

    /// Directory containing the PDF (used with --pdf-name).
    #[arg(long, env = "BASE_PDF_PATH")]
    base_path: Option<PathBuf>,

    /// PDF file name inside --base-path.
    #[arg(long, env = "PDF_NAME")]
    pdf_name: Option<String>,

    /// Extraction service credential.
    #[arg(long, env = "VISION_AGENT_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Extraction endpoint URL.
    #[arg(long, env = "CATALOG_OCR_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Number of pages extracted concurrently.
    #[arg(short, long, env = "CATALOG_OCR_WORKERS", default_value_t = 4,
          value_parser = clap::value_parser!(u16).range(1..))]
    workers: u16,

    /// Root directory for run output.
    #[arg(short, long, env = "CATALOG_OCR_OUTPUT", default_value = DEFAULT_OUTPUT_ROOT)]
    output_root: PathBuf,

    /// JSON Schema file to send instead of the built-in product schema.
    #[arg(long, env = "CATALOG_OCR_SCHEMA")]
    schema: Option<PathBuf>,

    /// Bind this pdfium library instead of the bundled or cached one.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Send the whole PDF in one request instead of splitting it.
    #[arg(long)]
    whole_document: bool,

    /// Print the result as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// List every extracted product after the page summary.
    #[arg(long)]
    products: bool,

    /// Disable progress bar.
    #[arg(long, env = "CATALOG_OCR_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = <Cli as clap::Parser>::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.whole_document;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Pre-flight: every required setting before any work ───────────────
    let source = resolve_input(&cli)?;
    let mut client = ClientConfig::new(cli.api_key.clone())
        .context("Invalid credential")?
        .with_endpoint(cli.endpoint.clone());
    if let Some(ref path) = cli.schema {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read schema {}", path.display()))?;
        let schema: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Schema {} is not valid JSON", path.display()))?;
        client = client.with_schema(Arc::new(schema));
    }

    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let mut builder = PipelineConfig::builder()
        .max_workers(usize::from(cli.workers))
        .output_root(cli.output_root.clone())
        .client(client);
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.splitter(Arc::new(PdfiumSplitter::with_library(lib)));
    }
    let config = builder.build().context("Invalid configuration")?;

    // ── Whole-document mode ──────────────────────────────────────────────
    if cli.whole_document {
        let extraction = extract_document(&source, &config)
            .await
            .context("Extraction failed")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&extraction).context("Failed to serialise output")?
            );
        } else if !cli.quiet {
            let summary = format_page_summary(1, &PageResult::from(extraction));
            println!("{}", summary.trim_end());
        }
        return Ok(());
    }

    // ── Page-by-page mode ────────────────────────────────────────────────
    let report = process_pdf_by_pages(&source, &config)
        .await
        .context("Processing failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        print_report(&report);
        if cli.products {
            print_products(&report);
        }
    }

    Ok(())
}

/// Positional input wins; otherwise BASE_PDF_PATH and PDF_NAME are both required.
fn resolve_input(cli: &Cli) -> Result<PathBuf> {
    if let Some(ref input) = cli.input {
        return Ok(input.clone());
    }
    match (&cli.base_path, &cli.pdf_name) {
        (Some(base), Some(name)) => Ok(source_path(base, name)),
        (None, _) => anyhow::bail!(
            "No input PDF. Pass a path, or set BASE_PDF_PATH and PDF_NAME (BASE_PDF_PATH is missing)."
        ),
        (_, None) => anyhow::bail!(
            "No input PDF. Pass a path, or set BASE_PDF_PATH and PDF_NAME (PDF_NAME is missing)."
        ),
    }
}

fn print_report(report: &RunReport) {
    let summary = &report.summary;
    println!("Output directory: {}", bold(&summary.output_directory.display().to_string()));
    println!("Total pages:      {}", summary.total_pages);
    println!("Successful pages: {}", green(&summary.successful_pages.to_string()));
    println!(
        "Failed pages:     {}",
        if summary.failed_pages == 0 {
            summary.failed_pages.to_string()
        } else {
            red(&summary.failed_pages.to_string())
        }
    );
    println!("Products:         {}", report.product_count());

    println!();
    println!("Page Results:");
    for (page_num, result) in &report.page_results {
        if result.is_success() {
            println!("  Page {page_num}: SUCCESS - {} products", result.products().len());
        } else {
            let error = result.error().unwrap_or_default();
            println!("  Page {page_num}: {} - {error}", red("ERROR"));
        }
    }
}

fn print_products(report: &RunReport) {
    println!();
    println!("Products:");
    for product in report.products() {
        println!(
            "  {:<10} {:<32} {:>2}  ${:.2}",
            product.id, product.name, product.size, product.price
        );
    }
}
