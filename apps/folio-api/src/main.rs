use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = folio_api::Args::parse();

	folio_api::run(args).await
}
