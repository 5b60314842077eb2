//! colorbook-gen: terminal front-end to the page generator.
//!
//! ```text
//! colorbook-gen categories
//! colorbook-gen generate -c animals -n 5 --img
//! colorbook-gen onebit site/categories
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing::{info, warn};

use colorbook::catalog::Catalog;
use colorbook::config;
use colorbook::error::AppError;
use colorbook::generator::onebit;
use colorbook::generator::wordpool::{self, load_lines};
use colorbook::generator::{GenerateRequest, Generator};
use colorbook::logger;

#[derive(Parser, Debug)]
#[command(name = "colorbook-gen", version, about = "Generate coloring pages")]
struct Args {
    /// Config file (default: config/default.toml when present)
    #[arg(short = 'f', long = "config", value_name = "FILE", global = true)]
    config: Option<String>,

    /// Site root holding pages.json, categories/ and app/
    #[arg(long, value_name = "DIR", global = true)]
    root: Option<PathBuf>,

    /// Raise log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List category folders with their word pool sizes
    Categories,

    /// Synthesize pages and append them to the category file
    Generate {
        /// Category folder name
        #[arg(short, long)]
        category: String,

        /// Number of pages
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// Also generate images through the remote API
        #[arg(long)]
        img: bool,

        /// Do not touch the category file or convert images
        #[arg(long)]
        dry: bool,

        /// Aspect ratio sent to the image API
        #[arg(long = "ar", value_name = "RATIO")]
        aspect_ratio: Option<String>,

        /// Image model name
        #[arg(long)]
        model: Option<String>,

        /// Regenerate images that already exist on disk
        #[arg(long)]
        overwrite: bool,

        /// Keep images in full color
        #[arg(long)]
        no_onebit: bool,

        /// Re-threshold existing images even when already 1-bit
        #[arg(long)]
        reconvert: bool,
    },

    /// Convert every PNG one level below DIR to 1-bit
    Onebit {
        /// Directory whose sub-folders hold PNG files
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = config::load(args.config.as_deref())?;
    if let Some(root) = args.root {
        config.site.root = root;
    }

    // The CLI stays quiet unless asked: stdout carries the report.
    let cli_level = logger::verbosity_level(args.verbose);
    logger::init(cli_level.unwrap_or("warn"), cli_level.is_some())?;

    let catalog = Catalog::new(&config.site.root);

    match args.command {
        Command::Categories => list_categories(&catalog),
        Command::Generate {
            category,
            count,
            img,
            dry,
            aspect_ratio,
            model,
            overwrite,
            no_onebit,
            reconvert,
        } => {
            let mut req = GenerateRequest::new(category, &config.generator);
            req.count = count;
            req.img = img;
            req.dry = dry;
            if let Some(ar) = aspect_ratio {
                req.aspect_ratio = ar;
            }
            if let Some(model) = model {
                req.model = model;
            }
            req.skip_img_existing = !overwrite;
            req.onebit = !no_onebit;
            req.skip_onebit_existing = !reconvert;
            req.api_key = config.api_key.clone();

            let generator = Generator::new(catalog, &config.generator)
                .map_err(|e| AppError::Generator(e.to_string()))?;
            match generator.run(req).await {
                Ok(report) => print_json(&report),
                Err(e) => {
                    print_json(&e.to_json())?;
                    Err(AppError::Generator(e.to_string()))
                }
            }
        }
        Command::Onebit { dir } => convert_dir(&dir),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::Generator(format!("cannot serialize report: {e}")))?;
    println!("{text}");
    Ok(())
}

fn list_categories(catalog: &Catalog) -> Result<(), AppError> {
    let names = wordpool::list_categories(catalog)?;
    if names.is_empty() {
        println!("no category folders under {}", catalog.categories_dir().display());
        return Ok(());
    }
    println!("{:<24} {:>10} {:>8} {:>12}", "category", "characters", "actions", "environments");
    for name in names {
        let dir = catalog.category_dir(&name);
        let count = |file: &str| load_lines(&dir.join(file)).len();
        println!(
            "{:<24} {:>10} {:>8} {:>12}",
            name,
            count("characters.txt"),
            count("actions.txt"),
            count("environments.txt"),
        );
    }
    Ok(())
}

fn convert_dir(dir: &std::path::Path) -> Result<(), AppError> {
    if !onebit::AVAILABLE {
        return Err(AppError::Generator(
            "1-bit conversion is not compiled into this build (feature `onebit`)".into(),
        ));
    }
    let (converted, skipped, failures) = onebit::convert_tree(dir)?;
    for (path, e) in &failures {
        warn!(path = %path.display(), error = %e, "conversion failed");
        eprintln!("failed: {}: {e}", path.display());
    }
    info!(converted, skipped, failed = failures.len(), "conversion finished");
    println!("converted {converted}, already 1-bit {skipped}, failed {}", failures.len());
    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::Generator(format!("{} file(s) failed to convert", failures.len())))
    }
}
