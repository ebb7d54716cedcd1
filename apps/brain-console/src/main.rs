use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = brain_console::Args::parse();

	brain_console::run(args).await
}
