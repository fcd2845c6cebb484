//! snippetbox - a small snippet-sharing web server.
//!
//! Settings are resolved in order: built-in defaults, an optional TOML file
//! (`--config`), `SNIPPETBOX_*` environment variables, then command-line
//! flags. The template cache is built before the listener is bound; a
//! broken template directory stops the process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use snippetbox_core::logging::setup_logging;
use snippetbox_core::{settings_loader, Settings};
use snippetbox_template::TemplateCache;
use snippetbox_views::SnippetboxApp;

#[derive(Parser, Debug)]
#[command(name = "snippetbox")]
#[command(about = "Serve the snippetbox web application")]
#[command(version)]
struct Cli {
    /// Address to listen on (e.g. 127.0.0.1:4000)
    #[arg(long)]
    addr: Option<String>,

    /// Path to a TOML settings file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding base.html, partials/ and pages/
    #[arg(long)]
    template_dir: Option<PathBuf>,

    /// Directory served under /static/
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Enable debug mode (pretty logs)
    #[arg(long)]
    debug: bool,
}

impl Cli {
    /// Loads settings from the config file and environment, then applies
    /// the command-line overrides.
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => settings_loader::from_toml_file_with_env(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => settings_loader::from_env(),
        };
        self.apply(&mut settings);
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings) {
        if let Some(addr) = &self.addr {
            settings.addr.clone_from(addr);
        }
        if let Some(dir) = &self.template_dir {
            settings.template_dir.clone_from(dir);
        }
        if let Some(dir) = &self.static_dir {
            settings.static_dir.clone_from(dir);
        }
        if self.debug {
            settings.debug = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = cli.settings()?;
    setup_logging(&settings);

    let templates = TemplateCache::from_dir(&settings.template_dir).with_context(|| {
        format!(
            "building template cache from {}",
            settings.template_dir.display()
        )
    })?;
    tracing::info!(pages = ?templates.page_names(), "templates loaded");

    SnippetboxApp::new(settings, Arc::new(templates))
        .run()
        .await
        .context("server error")?;
    Ok(())
}
