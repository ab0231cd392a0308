use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = matching_worker::Args::parse();

	matching_worker::run(args).await
}
