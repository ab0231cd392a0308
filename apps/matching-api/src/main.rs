use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = matching_api::Args::parse();

	matching_api::run(args).await
}
