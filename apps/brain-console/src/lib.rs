use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use brain_domain::{ContentId, ContentKind, NewContent, Tags};
use brain_service::BrainService;

#[derive(Debug, Parser)]
#[command(
	version = brain_cli::VERSION,
	rename_all = "kebab",
	styles = brain_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run one search and print the outcome as JSON.
	Search { query: String },
	/// Print the current content listing as JSON.
	List,
	/// Create a piece of content.
	Add {
		#[arg(long)]
		title: String,
		#[arg(long, value_enum, default_value_t = KindArg::Note)]
		kind: KindArg,
		#[arg(long, default_value = "")]
		body: String,
		#[arg(long)]
		link: Option<String>,
		#[arg(long = "tag")]
		tags: Vec<String>,
	},
	/// Send a failed item back for processing.
	Retry { id: String },
	Delete { id: String },
	/// Keep the listing fresh while items are processing. Stops on Ctrl-C.
	Watch,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
	Link,
	Note,
	Bookmark,
}
impl From<KindArg> for ContentKind {
	fn from(kind: KindArg) -> Self {
		match kind {
			KindArg::Link => Self::Link,
			KindArg::Note => Self::Note,
			KindArg::Bookmark => Self::Bookmark,
		}
	}
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = brain_config::load(&args.config)?;

	init_tracing(&config)?;

	let mut service = BrainService::connect(&config)?;

	match args.command {
		Command::Search { query } => {
			let status = service.search.submit(&query).await?;
			let outcome =
				status.outcome().ok_or_else(|| eyre::eyre!("Search was cancelled."))?;

			println!("{}", serde_json::to_string_pretty(outcome)?);
		},
		Command::List => {
			service.load().await?;

			println!("{}", serde_json::to_string_pretty(&service.store.snapshot())?);
		},
		Command::Add { title, kind, body, link, tags } => {
			let new = NewContent { kind: kind.into(), title, body, tags: Tags::new(tags), link };
			let created = service.mutations.create(ContentId::temporary(), new).await?;

			println!("{}", serde_json::to_string_pretty(&created)?);
		},
		Command::Retry { id } => {
			service.load().await?;

			let retried = service.mutations.retry(&ContentId::new(id)).await?;

			println!("{}", serde_json::to_string_pretty(&retried)?);
		},
		Command::Delete { id } => {
			service.load().await?;
			service.mutations.delete(&ContentId::new(id)).await?;
		},
		Command::Watch => watch(&mut service).await?,
	}

	service.shutdown().await;

	Ok(())
}

async fn watch(service: &mut BrainService) -> color_eyre::Result<()> {
	let count = service.load().await?;
	let mut changes = service.store.subscribe();

	tracing::info!(count, transient = service.store.has_transient(), "Watching content.");
	service.start_poller();

	loop {
		tokio::select! {
			res = tokio::signal::ctrl_c() => {
				res?;

				break;
			},
			changed = changes.changed() => {
				if changed.is_err() {
					break;
				}

				tracing::info!(
					count = service.store.len(),
					transient = service.store.has_transient(),
					"Content changed."
				);
			},
		}
	}

	Ok(())
}

fn init_tracing(config: &brain_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
