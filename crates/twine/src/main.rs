use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::Parser;
use log::debug;
use twine::{
    config::{Config, ContentProcess},
    orchestrator::Bundler,
    template::TemplateData,
};

#[derive(Parser, Debug)]
#[command(name = "twine", version, about = "Stitch a require() graph of JavaScript files into a single script")]
struct Cli {
    /// Entry file or glob pattern
    entry: String,

    /// Write the bundle here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also emit `<output>.map` and a sourceMappingURL comment
    #[arg(long, requires = "output")]
    source_map: bool,

    /// Root against which directive arguments are resolved
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Wrapping template (must interpolate `src` exactly once)
    #[arg(long)]
    template: Option<String>,

    /// Separator inserted between sections
    #[arg(long)]
    separator: Option<String>,

    /// Files to include verbatim without scanning (repeatable)
    #[arg(long = "skip", value_name = "FILE")]
    skip_files: Vec<PathBuf>,

    /// Read configuration from a TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Process each file as a template with data from this TOML file
    #[arg(long, value_name = "FILE")]
    process_data: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    if let Some(base_path) = cli.base_path {
        config.base_path = base_path;
    }
    if let Some(template) = cli.template {
        config.template = template;
    }
    if let Some(separator) = cli.separator {
        config.separator = separator;
    }
    config.skip_files.extend(cli.skip_files);
    debug!("effective config: {config:?}");

    let mut bundler = Bundler::new(config)?;
    if let Some(data_path) = &cli.process_data {
        bundler = bundler.with_process(ContentProcess::Template(load_process_data(data_path)?));
    }

    let bundle = bundler.bundle(&cli.entry)?;

    match &cli.output {
        Some(output) => {
            let mut code = bundle.code;
            if cli.source_map {
                let map_name = format!(
                    "{}.map",
                    output
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default()
                );
                code.push_str(&format!("\n//# sourceMappingURL={map_name}\n"));
                let map_path = output.with_file_name(&map_name);
                let mut map_file = fs::File::create(&map_path)
                    .with_context(|| format!("failed to create `{}`", map_path.display()))?;
                bundle
                    .map
                    .to_writer(&mut map_file)
                    .with_context(|| format!("failed to write `{}`", map_path.display()))?;
            }
            fs::write(output, code)
                .with_context(|| format!("failed to write `{}`", output.display()))?;
        }
        None => {
            io::stdout().write_all(bundle.code.as_bytes())?;
        }
    }
    Ok(())
}

/// Template data for `--process-data`: a flat TOML table; non-string values
/// are rendered with their TOML notation.
fn load_process_data(path: &Path) -> anyhow::Result<TemplateData> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read `{}`", path.display()))?;
    let table: toml::Table = raw
        .parse()
        .with_context(|| format!("failed to parse `{}`", path.display()))?;
    Ok(table
        .into_iter()
        .map(|(key, value)| {
            let rendered = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, rendered)
        })
        .collect())
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
