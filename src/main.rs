// ABOUTME: Main entry point for the decksmith program.
// ABOUTME: Provides CLI interface and executes commands from the library.

use clap::{Args, Parser, Subcommand};
use decksmith::cache::DeckCache;
use decksmith::images::ImageSource;
use decksmith::utils;
use decksmith::{
    create_minimal_template, export_deck, generate_full_deck, Config, DeckError, DeckRequest,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Propose an outline for a deck (generates and caches the full deck)
    Outline(BriefArgs),

    /// Generate a full deck and print it as JSON
    Generate(BriefArgs),

    /// Generate a deck and export it to a PowerPoint file
    Export(ExportArgs),

    /// Write the built-in minimal template
    Template(TemplateArgs),

    /// Remove every cached deck
    ClearCache(CacheArgs),
}

#[derive(Args)]
struct BriefArgs {
    /// Topic the deck should cover
    #[arg(short, long)]
    topic: String,

    /// Audience the deck is aimed at
    #[arg(short, long, default_value = "a general audience")]
    audience: String,

    /// Tone of the deck
    #[arg(long, default_value = "informative")]
    tone: String,

    /// Number of content slides
    #[arg(short = 'n', long, default_value_t = 5, value_parser = clap::value_parser!(u32).range(1..))]
    slide_count: u32,

    /// Cache backend to use: memory or redis
    #[arg(long)]
    cache: Option<String>,
}

impl BriefArgs {
    fn to_request(&self) -> DeckRequest {
        DeckRequest::new(
            self.topic.clone(),
            self.audience.clone(),
            self.tone.clone(),
            self.slide_count,
        )
    }
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    brief: BriefArgs,

    /// Path for the output .pptx file (defaults to the downloads directory,
    /// named after the topic)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Template .pptx whose masters and layouts style the deck
    #[arg(long)]
    template: Option<PathBuf>,

    /// Skip stock photo lookups
    #[arg(long)]
    no_images: bool,
}

#[derive(Args)]
struct TemplateArgs {
    /// Where to write the template (defaults to the configured path)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct CacheArgs {
    /// Cache backend to clear: memory or redis
    #[arg(long)]
    cache: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let mut config = Config::from_env();

    let result = match &cli.command {
        Some(Commands::Outline(args)) => {
            apply_cache_override(&mut config, args.cache.as_deref());
            run_outline(&config, args)
        }
        Some(Commands::Generate(args)) => {
            apply_cache_override(&mut config, args.cache.as_deref());
            run_generate(&config, args)
        }
        Some(Commands::Export(args)) => {
            apply_cache_override(&mut config, args.brief.cache.as_deref());
            run_export(&config, args)
        }
        Some(Commands::Template(args)) => run_template(&config, args),
        Some(Commands::ClearCache(args)) => {
            apply_cache_override(&mut config, args.cache.as_deref());
            run_clear_cache(&config)
        }
        None => {
            println!("No command specified. Use --help for usage information.");
            Ok(())
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn apply_cache_override(config: &mut Config, backend: Option<&str>) {
    if let Some(backend) = backend {
        config.cache_backend = backend.to_string();
    }
}

fn run_outline(config: &Config, args: &BriefArgs) -> decksmith::Result<()> {
    let request = args.to_request();
    let generator = config.build_generator()?;
    let cache = config.build_cache()?;

    let deck = generate_full_deck(&request, &generator, cache.as_ref())?;
    let rendered = serde_json::to_string_pretty(&deck.outline)
        .map_err(|e| DeckError::UnknownError(format!("Could not render outline: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn run_generate(config: &Config, args: &BriefArgs) -> decksmith::Result<()> {
    let request = args.to_request();
    let generator = config.build_generator()?;
    let cache = config.build_cache()?;

    let deck = generate_full_deck(&request, &generator, cache.as_ref())?;
    let rendered = serde_json::to_string_pretty(&deck)
        .map_err(|e| DeckError::UnknownError(format!("Could not render deck: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn run_export(config: &Config, args: &ExportArgs) -> decksmith::Result<()> {
    let request = args.brief.to_request();
    let generator = config.build_generator()?;
    let cache = config.build_cache()?;
    let export_config = config.get_export_config(args.template.clone());

    let output_path = match &args.output {
        Some(path) => path.clone(),
        None => {
            utils::ensure_directory_exists(&config.downloads_dir)?;
            config
                .downloads_dir
                .join(format!("{}.pptx", utils::sanitize_filename(&request.topic)))
        }
    };
    match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            utils::validate_directory_writable(parent)?
        }
        _ => {}
    }

    let images = if args.no_images {
        None
    } else {
        Some(config.build_image_source()?)
    };
    let images_ref = images.as_ref().map(|source| source as &dyn ImageSource);

    println!("Generating deck for topic: {}", request.topic);
    let path = export_deck(
        &request,
        &generator,
        cache.as_ref(),
        images_ref,
        &export_config,
        &output_path,
    )?;
    println!("Presentation exported to {:?}", path);
    Ok(())
}

fn run_template(config: &Config, args: &TemplateArgs) -> decksmith::Result<()> {
    let path = args
        .output
        .clone()
        .unwrap_or_else(|| config.template_path.clone());
    create_minimal_template(&path)?;
    println!("Template written to {:?}", path);
    Ok(())
}

fn run_clear_cache(config: &Config) -> decksmith::Result<()> {
    let cache = config.build_cache()?;
    cache.clear();
    println!("Cache cleared");
    Ok(())
}
