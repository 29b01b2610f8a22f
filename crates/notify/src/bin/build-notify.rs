//! build-notify - render and deliver Slack notifications for build events.
//!
//! # Environment Variables
//!
//! - `SLACK_WEBHOOK_URL` - webhook URL used for the config's `webhookUrl`
//!   secret (required for `send`)
//! - `RUST_LOG` - log filter (defaults to `info`)
//!
//! # Examples
//!
//! ```bash
//! # Print the payload that would be posted for a build
//! build-notify render --config slack.yaml --template slack.json --event build.json
//!
//! # Render and post it, reading the build from stdin
//! cat build.json | build-notify send --config slack.yaml --template slack.json --event -
//! ```

use anyhow::{Context, Result};
use build_notify::{
    Build, MessageRenderer, NotifierConfig, Outcome, ParamBindingResolver, SlackNotifier,
    StaticSecrets,
};
use build_notify::{BindingResolver, EventFilter};
use clap::{Args, Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Render build events into Slack messages and post them to a webhook.
#[derive(Parser)]
#[command(name = "build-notify")]
#[command(about = "Render build events into Slack messages and post them to a webhook")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the rendered webhook payload as JSON
    Render(Inputs),

    /// Render the payload and post it to the webhook
    Send {
        #[command(flatten)]
        inputs: Inputs,

        /// Webhook URL (or set `SLACK_WEBHOOK_URL` env var)
        #[arg(long, env = "SLACK_WEBHOOK_URL", hide_env_values = true)]
        webhook_url: String,
    },
}

#[derive(Args)]
struct Inputs {
    /// Notifier config YAML
    #[arg(long, short)]
    config: PathBuf,

    /// Block Kit template; defaults to the config's template uri
    #[arg(long, short)]
    template: Option<PathBuf>,

    /// Build event JSON file, or `-` for stdin
    #[arg(long, short, default_value = "-")]
    event: String,
}

struct Loaded {
    config: NotifierConfig,
    template: String,
    build: Build,
}

impl Inputs {
    fn load(&self) -> Result<Loaded> {
        let config = NotifierConfig::from_file(&self.config)
            .with_context(|| format!("Failed to load config {}", self.config.display()))?;

        let template_path = match &self.template {
            Some(path) => path.clone(),
            None => {
                let uri = config
                    .spec
                    .notification
                    .template
                    .as_ref()
                    .map(|t| t.uri.as_str())
                    .filter(|uri| !uri.is_empty())
                    .context("No --template given and config has no template uri")?;
                resolve_relative(&self.config, uri)
            }
        };
        let template = std::fs::read_to_string(&template_path)
            .with_context(|| format!("Failed to read template {}", template_path.display()))?;

        let raw_event = if self.event == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read build event from stdin")?;
            buf
        } else {
            std::fs::read_to_string(&self.event)
                .with_context(|| format!("Failed to read build event {}", self.event))?
        };
        let build = Build::from_json(&raw_event).context("Failed to parse build event")?;

        Ok(Loaded {
            config,
            template,
            build,
        })
    }
}

/// Template uris are relative to the config file's directory.
fn resolve_relative(config_path: &Path, uri: &str) -> PathBuf {
    let uri = Path::new(uri);
    if uri.is_absolute() {
        return uri.to_path_buf();
    }
    config_path
        .parent()
        .map_or_else(|| uri.to_path_buf(), |dir| dir.join(uri))
}

fn render(inputs: &Inputs) -> Result<()> {
    let Loaded {
        config,
        template,
        build,
    } = inputs.load()?;

    let filter = build_notify::filter::from_expression(&config.spec.notification.filter)?;
    if !filter.apply(&build) {
        tracing::info!(build_id = %build.id, "Build filtered out, nothing to render");
        return Ok(());
    }

    let renderer = MessageRenderer::new(&template, config.message_template())?;
    let bindings = ParamBindingResolver.resolve(&config.spec.notification.params, &build)?;
    let message = renderer.render(&build, &bindings)?;

    println!("{}", serde_json::to_string_pretty(&message)?);
    Ok(())
}

async fn send(inputs: &Inputs, webhook_url: String) -> Result<()> {
    let Loaded {
        config,
        template,
        build,
    } = inputs.load()?;

    let secret_ref = config.secret_ref(build_notify::notifier::WEBHOOK_URL_SECRET_NAME)?;
    let resource = config.find_secret_resource(secret_ref)?.to_string();
    let secrets = StaticSecrets::new().with(resource, webhook_url);

    let notifier = SlackNotifier::set_up(
        &config,
        &template,
        &secrets,
        Arc::new(ParamBindingResolver),
    )
    .await
    .context("Failed to set up notifier")?;

    match notifier
        .send_notification(&build)
        .await
        .context("Failed to send notification")?
    {
        Outcome::Skipped => tracing::info!(build_id = %build.id, "Build filtered out"),
        Outcome::Delivered => tracing::info!(build_id = %build.id, "Notification delivered"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render(inputs) => render(&inputs),
        Commands::Send {
            inputs,
            webhook_url,
        } => send(&inputs, webhook_url).await,
    }
}
