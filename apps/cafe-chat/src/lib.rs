pub mod repl;

use std::path::PathBuf;

use clap::{
	Parser,
	builder::{
		Styles,
		styling::{AnsiColor, Effects},
	},
};
use color_eyre::eyre;
use tracing_subscriber::EnvFilter;

use cafe_service::ServiceSlot;

#[derive(Debug, Parser)]
#[command(
	version,
	rename_all = "kebab",
	styles = styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// Session to continue. A fresh one is generated when omitted.
	#[arg(long, value_name = "ID")]
	pub session: Option<String>,
	/// Answer one message and exit instead of starting the prompt loop.
	#[arg(long, short = 'm', value_name = "TEXT")]
	pub message: Option<String>,
}

pub fn styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Red.on_default() | Effects::BOLD)
		.usage(AnsiColor::Red.on_default() | Effects::BOLD)
		.literal(AnsiColor::Blue.on_default() | Effects::BOLD)
		.placeholder(AnsiColor::Green.on_default())
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = cafe_config::load(&args.config)?;
	init_tracing(&config)?;

	let slot = ServiceSlot::new();

	if let Err(err) = slot.spawn_load(config).await? {
		return Err(eyre::eyre!("Menu index is unavailable: {err}"));
	}

	let status = slot.status();
	tracing::info!(
		menu_version = status.menu_version.as_deref().unwrap_or_default(),
		num_items = status.num_items.unwrap_or_default(),
		"Menu index ready."
	);

	let service = slot.require()?;
	let session_id = args.session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

	match args.message {
		Some(message) => repl::answer(&service, &session_id, &message).await,
		None => repl::run_loop(service, session_id).await,
	}
}

fn init_tracing(config: &cafe_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
	Ok(())
}
