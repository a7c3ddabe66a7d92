//! `aurbuild` - incremental AUR package builder.
//!
//! Reads a package list, rebuilds the packages whose AUR version moved
//! since the last run, and publishes them into a pacman repository
//! directory together with a small landing page.

mod reporter;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use aurbuild_core::pipeline::load_context;
use aurbuild_core::{AurRpc, Pipeline, Reporter, RunSettings, SystemToolchain};
use aurbuild_schema::{AUR_BASE_URL, Arch, PackageName};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::reporter::TerminalReporter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Incremental AUR package builder", long_about = None)]
struct Args {
    /// Package list (YAML, or TOML when the file name ends in `.toml`)
    #[arg(short, long, env = "AURBUILD_CONFIG", default_value = "config.yml")]
    config: PathBuf,

    /// Root of the published repository tree
    #[arg(short, long, env = "AURBUILD_BUILD_DIR", default_value = "build")]
    build_dir: PathBuf,

    /// Repository architecture (`x86_64` or `aarch64`)
    #[arg(long, env = "AURBUILD_ARCH", default_value_t = Arch::X86_64)]
    arch: Arch,

    /// Cache directory for AUR clones
    #[arg(long, env = "AURBUILD_CLONE_DIR", default_value = "aur")]
    clone_dir: PathBuf,

    /// AUR base URL (RPC endpoint and git remotes)
    #[arg(long, env = "AURBUILD_AUR_URL", default_value = AUR_BASE_URL)]
    aur_url: String,

    /// Landing page template
    #[arg(long, env = "AURBUILD_TEMPLATE", default_value = "src/index.html")]
    template: PathBuf,

    /// Landing page icon
    #[arg(long, env = "AURBUILD_ICON", default_value = "src/icon.png")]
    icon: PathBuf,

    /// Seconds to wait for the AUR version lookup
    #[arg(long, env = "AURBUILD_TIMEOUT", default_value_t = 10)]
    timeout: u64,

    /// Show what would be built without fetching, building, or writing
    #[arg(long, env = "AURBUILD_DRY_RUN", default_value_t = false)]
    dry_run: bool,

    /// Only process this package
    #[arg(short, long, env = "AURBUILD_FILTER")]
    filter: Option<String>,

    /// Run pacman directly instead of through sudo
    #[arg(long, env = "AURBUILD_NO_SUDO", default_value_t = false)]
    no_sudo: bool,
}

impl Args {
    fn settings(&self) -> RunSettings {
        RunSettings {
            build_root: self.build_dir.clone(),
            arch: self.arch,
            clone_dir: self.clone_dir.clone(),
            aur_url: self.aur_url.clone(),
            index_template: self.template.clone(),
            icon: self.icon.clone(),
            upstream_timeout: Duration::from_secs(self.timeout),
            dry_run: self.dry_run,
            filter: self.filter.as_deref().map(PackageName::new),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    tracing::debug!(?args, "parsed arguments");

    let ctx = load_context(&args.config, args.settings())
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let upstream = AurRpc::new(&ctx.settings.aur_url, ctx.settings.upstream_timeout)
        .context("failed to create AUR client")?;
    let toolchain = SystemToolchain::new().with_sudo(!args.no_sudo);
    let reporter = TerminalReporter::from_env();

    reporter.info(&format!(
        "{} ({}, {} packages)",
        ctx.repo_name(),
        ctx.settings.arch,
        ctx.config.packages.len()
    ));

    let summary = Pipeline::new(&ctx, &upstream, &toolchain, &reporter)
        .run()
        .await?;

    if summary.exit_code() != 0 {
        std::process::exit(summary.exit_code());
    }
    Ok(())
}
