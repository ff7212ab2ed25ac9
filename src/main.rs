use anyhow::{Context, Result, bail};
use clap::Parser;
use mdpress::{
    cli::{BuildArgs, Cli, Commands},
    content::ContentStore,
    generator::{BuildOptions, StaticSiteGenerator},
    serve::serve_site,
    settings::SettingsManager,
    theme::ThemeManager,
};

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));

    if !cli.content.is_dir() {
        bail!("content directory not found: {}", cli.content.display());
    }

    match &cli.command {
        Commands::Build { build_args } => build_site(cli, build_args),
        Commands::Serve { interface, port } => serve_site(&cli.content, interface, *port),
    }
}

/// Generate the static site with CLI overrides applied over settings.
fn build_site(cli: &Cli, args: &BuildArgs) -> Result<()> {
    let store = ContentStore::new(&cli.content);
    let themes = ThemeManager::new(cli.content.join("themes"));
    let settings = SettingsManager::load(cli.content.join("settings.json"))
        .context("loading settings")?;
    let snapshot = settings.get();

    let mut options = BuildOptions::from_settings(&snapshot);
    if let Some(output) = &args.output {
        options.output_dir = output.clone();
    }
    if let Some(base_url) = &args.base_url {
        options.base_url = base_url.trim_end_matches('/').to_string();
    }
    if let Some(clean_urls) = args.clean_urls {
        options.clean_urls = clean_urls;
    }
    if let Some(minify) = args.minify {
        options.minify = minify;
    }

    let summary = StaticSiteGenerator::new(&store, &themes, &snapshot, options).build()?;
    if summary.pages_failed > 0 {
        bail!("{} pages failed to generate", summary.pages_failed);
    }
    Ok(())
}
