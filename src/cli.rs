//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Markdown CMS core and static site generator
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Content directory (posts/, pages/, custom/, themes/, settings.json)
    #[arg(short, long, default_value = "content")]
    pub content: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Shared build arguments for Build and Serve commands
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Output directory (default: staticOutputDir from settings.json)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Override base URL for the site.
    ///
    /// Useful for CI/CD deployments where the production URL differs from
    /// the one stored in settings.json.
    #[arg(long = "base-url")]
    pub base_url: Option<String>,

    /// Generate directory URLs (`/post/x/`) instead of `.html` files
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub clean_urls: Option<bool>,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate the static site into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Serve the site live from the content directory
    Serve {
        /// Interface to bind on
        #[arg(short, long, default_value = "127.0.0.1")]
        interface: String,

        /// Port to listen on (auto-increments when taken)
        #[arg(short, long, default_value_t = 4000)]
        port: u16,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_args() {
        let cli = Cli::parse_from([
            "mdpress",
            "build",
            "--base-url",
            "https://example.com",
            "--clean-urls",
            "false",
            "-o",
            "dist",
        ]);
        assert_eq!(cli.content, PathBuf::from("content"));
        let Commands::Build { build_args } = cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.base_url.as_deref(), Some("https://example.com"));
        assert_eq!(build_args.clean_urls, Some(false));
        assert_eq!(build_args.output, Some(PathBuf::from("dist")));
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::parse_from(["mdpress", "-c", "data", "serve"]);
        assert_eq!(cli.content, PathBuf::from("data"));
        let Commands::Serve { interface, port } = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(interface, "127.0.0.1");
        assert_eq!(port, 4000);
    }
}
