use almanac::config::{self, SiteConfig};
use almanac::controller::ContentCache;
use almanac::month::MonthToken;
use almanac::source::{ContentSource, DirSource, HttpSource};
use almanac::{generate, manifest, output, scaffold, validate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Where content is read from.
#[derive(clap::Args, Clone)]
struct SourceArgs {
    /// Read content from a published site instead of --root
    #[arg(long)]
    remote: Option<String>,

    /// Treat this month as the current one (MM.YYYY)
    #[arg(long)]
    today: Option<MonthToken>,
}

#[derive(Parser)]
#[command(name = "almanac")]
#[command(about = "Static card renderer for month-dated content folders")]
#[command(long_about = "\
Static card renderer for month-dated content folders

Each month is a folder with a sections.json manifest and one sub-folder per
section. Almanac renders the folders into themed cards: a live page per month
and an archive filterable by month and section.

Content structure:

  site/
  ├── almanac.toml                      # Site config (optional)
  ├── assets/links.json                 # Call-to-action URLs
  └── media/
      └── 03.2025/
          ├── sections.json             # Section list for the month
          ├── champion/
          │   ├── champion.json         # Payload
          │   └── champion.png
          ├── projects/
          │   ├── project-1/text.json   # Numbered, stops at the first gap
          │   └── project-2/text.json
          └── featured/
              ├── featured-items.json   # Optional folder list
              └── launch/text.json

Run 'almanac gen-config' to generate a documented almanac.toml.")]
#[command(version = env!("ALMANAC_VERSION"))]
struct Cli {
    /// Site root directory
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// More logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the live and archive pages
    Build {
        #[command(flatten)]
        source: SourceArgs,

        /// Output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// List the months that have a sections.json
    Discover(SourceArgs),
    /// Load every month and report what was found, without writing anything
    Check(SourceArgs),
    /// Create a month folder with default sections
    SetupMonth {
        /// Month to create (MM.YYYY); defaults to the current month
        month: Option<String>,
    },
    /// Check that every JSON file in a month folder parses
    Validate {
        /// Month to validate (MM.YYYY)
        month: Option<String>,
    },
    /// Print a stock almanac.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Build { source, output: out_dir } => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.probing);
            let content = open_source(&cli.root, &source, &config)?;
            let today = source.today.unwrap_or_else(MonthToken::current);

            println!("==> Building from {}", content.describe());
            let report = generate::generate(content.as_ref(), &config, today, &out_dir)?;
            output::print_build_output(&report, &out_dir);
        }
        Command::Discover(source) => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.probing);
            let content = open_source(&cli.root, &source, &config)?;
            let today = source.today.unwrap_or_else(MonthToken::current);
            let window = config.discovery.window_months;

            let months = manifest::discover_months(content.as_ref(), &config.media_dir, today, window);
            output::print_discover_output(&months, today, window);
        }
        Command::Check(source) => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.probing);
            let content = open_source(&cli.root, &source, &config)?;
            let today = source.today.unwrap_or_else(MonthToken::current);

            println!("==> Checking {}", content.describe());
            let cache: ContentCache = generate::load_site(content.as_ref(), &config, today);
            output::print_check_output(&cache);
        }
        Command::SetupMonth { month } => {
            let config = config::load_config(&cli.root)?;
            let month = resolve_setup_month(month.as_deref());
            let report = scaffold::setup_month(&cli.root, &config.media_dir, month)?;
            output::print_setup_output(&report);
        }
        Command::Validate { month } => {
            let config = config::load_config(&cli.root)?;
            let Some(month) = month else {
                eprintln!("Please provide a month in MM.YYYY format, e.g. almanac validate 08.2025");
                std::process::exit(1);
            };
            match validate::validate_month(&cli.root, &config.media_dir, &month) {
                Ok(report) => {
                    output::print_validate_output(&report);
                    if !report.is_ok() {
                        std::process::exit(1);
                    }
                }
                Err(e) => {
                    eprintln!("{e}");
                    std::process::exit(1);
                }
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// `warn` by default; `RUST_LOG` still wins when set.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Initialize the rayon thread pool used for probing.
///
/// Caps at the number of available CPU cores.
fn init_thread_pool(probing: &config::ProbingConfig) {
    let threads = config::effective_threads(probing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

fn open_source(
    root: &std::path::Path,
    args: &SourceArgs,
    config: &SiteConfig,
) -> Result<Box<dyn ContentSource>, Box<dyn std::error::Error>> {
    let source: Box<dyn ContentSource> = match &args.remote {
        Some(url) => Box::new(HttpSource::new(url, &config.probing)?),
        None => Box::new(DirSource::new(root)),
    };
    Ok(source)
}

/// A missing or malformed argument means the current month.
fn resolve_setup_month(arg: Option<&str>) -> MonthToken {
    match arg.map(str::parse::<MonthToken>) {
        Some(Ok(month)) => month,
        Some(Err(e)) => {
            log::warn!("{e}; using the current month");
            MonthToken::current()
        }
        None => MonthToken::current(),
    }
}
