//! pdfoutline CLI - heading-aware PDF outline extraction

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use tempfile::NamedTempFile;

use pdfoutline::render::{self, image_caption, table_grid, JsonFormat};
use pdfoutline::{ContentNode, ErrorMode, HeadingOptions, PageContent, PageSelection, ParseOptions, PdfParser};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "pdfoutline")]
#[command(version)]
#[command(about = "Extract headings, paragraphs, tables and images from PDFs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct HeadingArgs {
    /// Fraction of the page height treated as the header zone
    #[arg(long, default_value_t = 0.25, env = "PDFOUTLINE_TOP_FRACTION")]
    top_fraction: f32,

    /// Minimum score for a line to count as a heading
    #[arg(long, default_value_t = 0.45, env = "PDFOUTLINE_THRESHOLD")]
    threshold: f32,
}

impl HeadingArgs {
    fn options(&self) -> HeadingOptions {
        HeadingOptions {
            top_fraction: self.top_fraction,
            score_threshold: self.threshold,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a PDF to outline JSON
    Convert {
        /// Input PDF file, or "-" to read from stdin
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Directory extracted images are written to
        #[arg(long, value_name = "DIR", default_value = "images")]
        images: PathBuf,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        /// Page range (e.g., "1-10", "1,3,5")
        #[arg(long)]
        pages: Option<String>,

        /// Fail on the first page that cannot be decoded
        #[arg(long)]
        strict: bool,

        #[command(flatten)]
        heading: HeadingArgs,
    },

    /// Render one page in the terminal
    Show {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page number (1-indexed)
        #[arg(short, long)]
        page: u32,

        /// Directory extracted images are written to
        #[arg(long, value_name = "DIR", default_value = "images")]
        images: PathBuf,

        /// Print without colors (for piping)
        #[arg(long)]
        plain: bool,

        #[command(flatten)]
        heading: HeadingArgs,
    },

    /// List heading candidates as JSON
    Headings {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Only this page (1-indexed)
        #[arg(short, long)]
        page: Option<u32>,

        /// Print every scored line instead of the headings only
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        heading: HeadingArgs,
    },

    /// Show page count and per-page node counts
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Convert {
            input,
            output,
            images,
            compact,
            pages,
            strict,
            heading,
        } => cmd_convert(
            &input,
            output.as_deref(),
            images,
            compact,
            pages.as_deref(),
            strict,
            &heading,
        ),
        Commands::Show {
            input,
            page,
            images,
            plain,
            heading,
        } => cmd_show(&input, page, images, plain, &heading),
        Commands::Headings {
            input,
            page,
            debug,
            heading,
        } => cmd_headings(&input, page, debug, &heading),
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

/// Resolve the input path, spooling stdin to a temporary file for "-".
///
/// The returned guard keeps the temporary file alive.
fn resolve_input(input: &Path) -> CliResult<(PathBuf, Option<NamedTempFile>)> {
    if input != Path::new("-") {
        return Ok((input.to_path_buf(), None));
    }

    let mut data = Vec::new();
    io::stdin().read_to_end(&mut data)?;
    let mut file = tempfile::Builder::new()
        .prefix("pdfoutline-")
        .suffix(".pdf")
        .tempfile()?;
    io::Write::write_all(&mut file, &data)?;
    log::debug!("Spooled {} bytes from stdin to {}", data.len(), file.path().display());
    Ok((file.path().to_path_buf(), Some(file)))
}

fn spinner(message: &'static str) -> CliResult<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    Ok(pb)
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    images: PathBuf,
    compact: bool,
    pages: Option<&str>,
    strict: bool,
    heading: &HeadingArgs,
) -> CliResult<()> {
    let page_selection = match pages {
        Some(p) => PageSelection::parse(p)?,
        None => PageSelection::All,
    };
    let options = ParseOptions::new()
        .with_heading(heading.options())
        .with_pages(page_selection)
        .with_image_dir(images)
        .with_error_mode(if strict {
            ErrorMode::Strict
        } else {
            ErrorMode::Lenient
        });

    let (path, _guard) = resolve_input(input)?;

    let pb = spinner("Parsing PDF... This may take a while.")?;
    let converted = pdfoutline::convert_with_options(&path, options);
    pb.finish_and_clear();
    let converted = converted?;

    if converted.is_empty() {
        return Err("no content found".into());
    }

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };
    let json = render::to_json(&converted, format)?;

    if let Some(path) = output {
        fs::write(path, &json)?;
        println!(
            "{} {} ({} pages)",
            "Saved to".green(),
            path.display(),
            converted.len()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

fn cmd_show(
    input: &Path,
    page: u32,
    images: PathBuf,
    plain: bool,
    heading: &HeadingArgs,
) -> CliResult<()> {
    let options = ParseOptions::new()
        .with_heading(heading.options())
        .with_image_dir(images);
    let content = pdfoutline::extract_page(input, page, &options)?;

    if plain {
        if content.is_empty() {
            println!("No content detected for this page.");
        } else {
            print!("{}", render::render_page(&content));
        }
        return Ok(());
    }

    println!("{}", format!("Page {}", page).cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    if content.is_empty() {
        println!("{}", "No content detected for this page.".yellow());
        return Ok(());
    }

    print_page(&content);
    Ok(())
}

fn print_page(page: &PageContent) {
    for node in &page.content {
        match node {
            ContentNode::Heading { text, .. } => {
                println!("{}", text.bold());
                println!();
            }
            ContentNode::Paragraph { text, .. } => {
                for line in text.lines() {
                    println!("{}", line);
                }
                println!();
            }
            ContentNode::Table { rows, .. } => {
                print!("{}", table_grid(rows));
                println!();
            }
            ContentNode::Image { path, .. } => {
                println!("{}", path);
                println!("{}", image_caption(page.page_number).dimmed());
                println!();
            }
        }
    }
}

fn cmd_headings(input: &Path, page: Option<u32>, debug: bool, heading: &HeadingArgs) -> CliResult<()> {
    let pages = match page {
        Some(p) => PageSelection::Pages(vec![p]),
        None => PageSelection::All,
    };

    let (candidates, lines) = pdfoutline::detect_headings(input, &heading.options(), &pages)?;

    let json = if debug {
        serde_json::to_string_pretty(&lines)?
    } else {
        serde_json::to_string_pretty(&candidates)?
    };
    println!("{}", json);

    Ok(())
}

fn cmd_info(input: &Path) -> CliResult<()> {
    // Images go to a scratch directory so counting them leaves nothing behind.
    let scratch = tempfile::tempdir()?;
    let options = ParseOptions::new().with_image_dir(scratch.path());
    let parser = PdfParser::open_with_options(input, options)?;

    let pb = spinner("Analyzing pages...")?;
    let pages = parser.parse();
    pb.finish_and_clear();
    let pages = pages?;

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), parser.version());
    println!("{}: {}", "Pages".bold(), parser.page_count());
    println!("{}: {}", "Pages with content".bold(), pages.len());

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    let mut totals = (0, 0, 0, 0);
    for page in &pages {
        let (h, p, t, i) = page.counts();
        println!(
            "{} {:>4}: {} headings, {} paragraphs, {} tables, {} images",
            "Page".bold(),
            page.page_number,
            h,
            p,
            t,
            i
        );
        totals = (totals.0 + h, totals.1 + p, totals.2 + t, totals.3 + i);
    }

    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Headings".bold(), totals.0);
    println!("{}: {}", "Paragraphs".bold(), totals.1);
    println!("{}: {}", "Tables".bold(), totals.2);
    println!("{}: {}", "Images".bold(), totals.3);

    Ok(())
}
