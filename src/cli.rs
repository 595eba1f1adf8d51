use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use passage_lens_lib::commands::popup_commands::SubmitOutcome;
use passage_lens_lib::config::ExtensionConfig;
use passage_lens_lib::Extension;

const OVERLAY_WAIT_ATTEMPTS: usize = 50;
const OVERLAY_WAIT_STEP_MS: u64 = 20;

#[derive(Parser, Debug)]
#[command(name = "passage-lens", about = "Search a passage index and jump to the match", version)]
pub struct Cli {
    /// Search service base URL (overrides config file and environment).
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Log filter used when RUST_LOG is unset.
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a search through the popup and print the results.
    Search {
        /// Query text.
        #[arg(required = true)]
        query: Vec<String>,
        /// Open result N (1-based) and show its highlight.
        #[arg(long)]
        open: Option<usize>,
        /// Print the popup's HTML fragment instead of text.
        #[arg(long, conflicts_with = "json")]
        html: bool,
        /// Print the popup view as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

fn resolve_config(cli: &Cli) -> Result<ExtensionConfig> {
    let mut config = ExtensionConfig::load()?;
    config.apply_overrides(cli.endpoint.clone(), cli.timeout.map(|t| t.to_string()))?;
    config.validate()?;
    Ok(config)
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    passage_lens_lib::init_tracing(&cli.log);
    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
        Command::Search {
            query,
            open,
            html,
            json,
        } => handle_search(config, &query.join(" "), open, html, json).await,
    }
}

async fn handle_search(
    config: ExtensionConfig,
    query: &str,
    open: Option<usize>,
    html: bool,
    json: bool,
) -> Result<()> {
    let extension = Extension::start(config)?;
    let popup = extension.open_popup();

    let outcome = popup.submit_search(query).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&popup.view())?);
    } else if html {
        println!("{}", popup.render_html());
    } else {
        print!("{}", popup.render_text());
        println!();
    }

    match outcome {
        SubmitOutcome::Ignored => bail!("query is empty"),
        SubmitOutcome::Failed(message) => bail!(message),
        SubmitOutcome::Superseded | SubmitOutcome::Displayed(_) => {}
    }

    if let Some(position) = open {
        if position == 0 {
            bail!("result positions start at 1");
        }
        let tab = popup
            .select_index(position - 1)
            .with_context(|| format!("cannot open result {position}"))?;
        let page = extension
            .browser()
            .page(tab)
            .context("tab closed before it loaded")?;

        let mut banner = None;
        for _ in 0..OVERLAY_WAIT_ATTEMPTS {
            banner = page
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .overlay_text();
            if banner.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(OVERLAY_WAIT_STEP_MS)).await;
        }
        let url = extension.browser().tab_url(tab).unwrap_or_default();
        match banner {
            Some(text) => println!("Opened tab {tab} at {url}\nRelevant Content: {text}"),
            None => println!("Opened tab {tab} at {url} (page does not accept highlights)"),
        }
    }

    popup.close();
    extension.shutdown();
    Ok(())
}
