//! # VibesCard Studio CLI
//!
//! Headless front end: builds a design from a template and event details,
//! then exports, publishes or updates it.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use card_core::{EventDetails, Notifier, Template, TracingNotifier};
use card_renderer::{ImageResolver, SvgStage};
use card_studio::{
    CliArgs, Command, CommunityDesign, DesignInputs, EditorSession, ExportPipeline,
    HttpDesignApi, HttpImageLoader, PublishRequest, StudioConfig,
};
use clap::Parser;
use serde::de::DeserializeOwned;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = StudioConfig::load(&args)?;
    tracing::info!("Starting VibesCard Studio v{}", card_studio::VERSION);
    tracing::debug!("API base URL: {}", config.api_base_url);

    let notifier: Arc<dyn Notifier> = Arc::new(TracingNotifier);
    let loader = HttpImageLoader::new(&config.asset_root)?;
    let resolver = ImageResolver::with_timeout(Arc::new(loader), config.image_timeout());
    let api = HttpDesignApi::new(&config.api_base_url, config.auth_token.clone())?;
    let pipeline = ExportPipeline::new(config.clone(), resolver, Arc::new(api));

    match args.command {
        Command::Export { inputs } => {
            let mut session = build_session(&config, notifier, &inputs).await?;
            let path = pipeline.export(&mut session).await?;
            println!("{}", path.display());
        }
        Command::Json { inputs } => {
            let session = build_session(&config, notifier, &inputs).await?;
            let path = pipeline.export_json(&session).await?;
            println!("{}", path.display());
        }
        Command::Publish {
            inputs,
            title,
            sub_title,
            tags,
        } => {
            let mut session = build_session(&config, notifier, &inputs).await?;
            let request = PublishRequest {
                title,
                sub_title,
                tags,
            };
            let outcome = pipeline.publish(&mut session, &request).await?;
            println!("{}", outcome.community_designs_id);
        }
        Command::Update {
            design,
            details,
            tags,
        } => {
            let design: CommunityDesign = read_json(&design)?;
            let mut session = EditorSession::open(
                SvgStage::new(1.0, 1.0),
                notifier,
                config.history_capacity,
                design,
            );
            if let Some(path) = details {
                session.set_details(read_json(&path)?);
            }
            pipeline.update(&session, &tags).await?;
        }
    }

    tracing::info!("VibesCard Studio finished");
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,card_studio=debug".into());
    let registry = tracing_subscriber::registry().with(filter);
    if std::env::var("RUST_LOG_FORMAT").is_ok_and(|f| f == "json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_session(
    config: &StudioConfig,
    notifier: Arc<dyn Notifier>,
    inputs: &DesignInputs,
) -> anyhow::Result<EditorSession<SvgStage>> {
    let mut session =
        EditorSession::new(SvgStage::new(1.0, 1.0), notifier, config.history_capacity);

    let details = match &inputs.details {
        Some(path) => read_json(path)?,
        None => EventDetails::starter(),
    };
    session.set_details(details);

    let template = match &inputs.template {
        Some(path) => read_json(path)?,
        None => Template::blank(),
    };
    session.apply_template(template).await?;
    Ok(session)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let raw =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}
