use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = cafe_chat::Args::parse();
	cafe_chat::run(args).await
}
