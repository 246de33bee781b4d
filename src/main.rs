//! glhm CLI - XBRL-GL hierarchy, instance and tidy table tool

use anyhow::{bail, Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use glhm::class_table::build_class_table;
use glhm::output;
use glhm::tidy::TidyTransform;
use glhm::{
    build_metadata, Encoding, Flattener, HierarchyWalker, InstanceParser, LabelResolver, Lhm,
    MetadataOptions, SchemaLoader, TaxonomyConfig, TidyParams,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// XBRL Global Ledger taxonomy flattener
#[derive(ClapParser)]
#[command(name = "glhm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log progress
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log every walked element
    #[arg(long, global = true)]
    debug: bool,

    /// CSV output encoding (utf-8-sig, utf-8)
    #[arg(long, global = true, default_value = "utf-8-sig")]
    encoding: Encoding,
}

#[derive(Args)]
struct TaxonomyArgs {
    /// Taxonomy root directory (contains gl/)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// JSON file with taxonomy settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Palette directory under gl/plt/
    #[arg(long)]
    palette: Option<String>,

    /// Taxonomy date (YYYY-MM-DD)
    #[arg(long)]
    date: Option<String>,

    /// Language code of the local labels
    #[arg(long)]
    lang: Option<String>,
}

#[derive(Args)]
struct MetadataArgs {
    /// Also write xBRL-CSV metadata JSON to this path
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Taxonomy entry point listed in the metadata
    #[arg(long, requires = "metadata")]
    entry_point: Option<String>,

    /// ISO 4217 currency of monetary columns
    #[arg(long, default_value = "USD")]
    currency: String,

    /// Reporting period end (YYYY-MM-DD)
    #[arg(long, requires = "metadata")]
    period: Option<String>,

    /// Entity identifier scheme URI
    #[arg(long, requires = "metadata")]
    entity_scheme: Option<String>,

    /// Entity identifier
    #[arg(long, requires = "metadata")]
    entity_id: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the taxonomy into an LHM CSV
    Hierarchy {
        #[command(flatten)]
        taxonomy: TaxonomyArgs,

        /// Output CSV
        #[arg(short, long, default_value = "lhm.csv")]
        output: PathBuf,
    },

    /// Flatten an instance document into a tidy CSV
    Flatten {
        /// Instance XML
        #[arg(short, long)]
        input: PathBuf,

        /// LHM CSV; the taxonomy is walked when omitted
        #[arg(short, long)]
        structure: Option<PathBuf>,

        #[command(flatten)]
        taxonomy: TaxonomyArgs,

        #[command(flatten)]
        meta: MetadataArgs,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Tidy CSV to nested JSON
    Nest {
        /// Params manifest
        #[arg(short, long)]
        params: PathBuf,

        /// Tidy CSV (defaults to file1_path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// JSON output (defaults to json_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Nested JSON back to tidy CSV
    Unnest {
        /// Params manifest
        #[arg(short, long)]
        params: PathBuf,

        /// JSON input (defaults to json_path)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Tidy CSV output (defaults to file2_path)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Tidy -> nested -> tidy, checking the result matches
    Roundtrip {
        /// Params manifest
        #[arg(short, long)]
        params: PathBuf,
    },

    /// Class/property table from an LHM CSV
    Classes {
        /// LHM CSV
        #[arg(short, long)]
        structure: PathBuf,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_logging(verbose: bool, debug: bool) {
    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn taxonomy_config(args: &TaxonomyArgs) -> Result<TaxonomyConfig> {
    let mut config = match &args.config {
        Some(path) => TaxonomyConfig::from_json_file(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?,
        None => TaxonomyConfig::default(),
    };
    if let Some(base_dir) = &args.base_dir {
        config = config.with_base_dir(base_dir);
    }
    if let Some(palette) = &args.palette {
        config = config.with_palette(palette);
    }
    if let Some(date) = &args.date {
        config = config.with_date(date)?;
    }
    if let Some(lang) = &args.lang {
        config = config.with_local_lang(lang);
    }
    if !config.base_dir.join("gl").is_dir() {
        bail!("No gl/ directory under {}", config.base_dir.display());
    }
    Ok(config)
}

fn walk_taxonomy(config: &TaxonomyConfig) -> Result<Lhm> {
    let schemas = SchemaLoader::new(config.clone())
        .load()
        .context("Failed to load taxonomy schemas")?;
    let labels = LabelResolver::new(config.clone())
        .load()
        .context("Failed to load label linkbases")?;
    let lhm = HierarchyWalker::new(&schemas, &labels, config).walk()?;

    for path in &lhm.report.unresolved {
        println!("  {} unresolved {}", "!".yellow(), path);
    }
    for path in &lhm.report.recursive {
        println!("  {} recursive {}", "!".yellow(), path);
    }
    Ok(lhm)
}

fn metadata_options(args: &MetadataArgs, taxonomy: &TaxonomyArgs) -> Result<MetadataOptions> {
    let mut options = MetadataOptions::default().with_currency(&args.currency)?;
    if let Some(date) = &taxonomy.date {
        let revision = TaxonomyConfig::default().with_date(date)?.date;
        options = options.with_revision(revision);
    }
    if let Some(entry_point) = &args.entry_point {
        options = options.with_taxonomy(entry_point);
    }
    if let Some(period) = &args.period {
        options = options.with_period(period)?;
    }
    if args.entity_scheme.is_some() || args.entity_id.is_some() {
        let scheme = args
            .entity_scheme
            .clone()
            .unwrap_or_else(|| options.entity_scheme.clone());
        let id = args.entity_id.clone().unwrap_or_else(|| options.entity_id.clone());
        options = options.with_entity(scheme, id);
    }
    Ok(options)
}

fn resolve(flag: Option<PathBuf>, manifest: Option<&PathBuf>, what: &str) -> Result<PathBuf> {
    match flag.or_else(|| manifest.cloned()) {
        Some(path) => Ok(path),
        None => bail!("No {what} given on the command line or in the params manifest"),
    }
}

fn done(path: &Path, detail: String, start: Instant) {
    println!(
        "{} {} ({}, {:.2}ms)",
        "✓".green().bold(),
        path.display(),
        detail,
        start.elapsed().as_secs_f64() * 1000.0
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.debug);
    let encoding = cli.encoding;

    match cli.command {
        Commands::Hierarchy { taxonomy, output } => {
            let start = Instant::now();
            let config = taxonomy_config(&taxonomy)?;
            let lhm = walk_taxonomy(&config)?;
            output::write_lhm_csv(&output, &lhm, encoding)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            let detail = format!(
                "{} rows, {} unresolved, {} recursive",
                lhm.len(),
                lhm.report.unresolved.len(),
                lhm.report.recursive.len()
            );
            done(&output, detail, start);
        }

        Commands::Flatten {
            input,
            structure,
            taxonomy,
            meta,
            output,
        } => {
            let start = Instant::now();
            let lhm = match structure {
                Some(path) => output::read_lhm_csv(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => walk_taxonomy(&taxonomy_config(&taxonomy)?)?,
            };
            let tree = InstanceParser::new()
                .parse_file(&input)
                .with_context(|| format!("Failed to parse {}", input.display()))?;

            let flattener = Flattener::new(&lhm);
            let table = flattener.to_tidy(&flattener.flatten(&tree));
            output::write_tidy_csv(&output, &table, encoding)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            done(&output, format!("{} rows", table.len()), start);

            if let Some(meta_path) = &meta.metadata {
                let options = metadata_options(&meta, &taxonomy)?;
                let url = output
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_default();
                output::write_json(meta_path, &build_metadata(&table, &lhm, &options, &url))
                    .with_context(|| format!("Failed to write {}", meta_path.display()))?;
                done(meta_path, format!("{} columns", table.columns.len()), start);
            }
        }

        Commands::Nest {
            params,
            input,
            output,
        } => {
            let start = Instant::now();
            let manifest = TidyParams::from_json_file(&params)
                .with_context(|| format!("Failed to read params {}", params.display()))?;
            let input = resolve(input, manifest.file1_path.as_ref(), "tidy CSV")?;
            let output = resolve(output, manifest.json_path.as_ref(), "JSON output")?;

            let table = output::read_tidy_csv(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let nested = TidyTransform::new(&manifest)
                .to_nested(&table)
                .with_context(|| format!("Failed to nest {}", input.display()))?;
            output::write_json(&output, &nested)?;
            done(&output, format!("{} rows nested", table.len()), start);
        }

        Commands::Unnest {
            params,
            input,
            output,
        } => {
            let start = Instant::now();
            let manifest = TidyParams::from_json_file(&params)
                .with_context(|| format!("Failed to read params {}", params.display()))?;
            let input = resolve(input, manifest.json_path.as_ref(), "JSON input")?;
            let output = resolve(output, manifest.file2_path.as_ref(), "tidy CSV output")?;

            let nested = output::read_json(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let table = TidyTransform::new(&manifest)
                .to_tidy(&nested)
                .with_context(|| format!("Failed to unnest {}", input.display()))?;
            output::write_tidy_csv(&output, &table, encoding)?;
            done(&output, format!("{} rows", table.len()), start);
        }

        Commands::Roundtrip { params } => {
            let manifest = TidyParams::from_json_file(&params)
                .with_context(|| format!("Failed to read params {}", params.display()))?;
            let input = resolve(None, manifest.file1_path.as_ref(), "file1_path")?;
            let json_path = resolve(None, manifest.json_path.as_ref(), "json_path")?;
            let output = resolve(None, manifest.file2_path.as_ref(), "file2_path")?;

            let transform = TidyTransform::new(&manifest);
            let table = output::read_tidy_csv(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let nested = transform.to_nested(&table)?;
            output::write_json(&json_path, &nested)?;
            let back = transform.to_tidy(&output::read_json(&json_path)?)?;
            output::write_tidy_csv(&output, &back, encoding)?;

            if back == table {
                println!(
                    "{} {} rows survived the round trip",
                    "✓".green().bold(),
                    table.len()
                );
            } else {
                println!(
                    "{} {} differs from {}",
                    "✗".red().bold(),
                    output.display(),
                    input.display()
                );
                std::process::exit(1);
            }
        }

        Commands::Classes { structure, output } => {
            let start = Instant::now();
            let lhm = output::read_lhm_csv(&structure)
                .with_context(|| format!("Failed to read {}", structure.display()))?;
            let table = build_class_table(&lhm);
            output::write_records(&output, &table, encoding)
                .with_context(|| format!("Failed to write {}", output.display()))?;
            done(&output, format!("{} rows", table.len()), start);
        }
    }

    Ok(())
}
