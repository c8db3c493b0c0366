use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = tessera_cli::Args::parse();
	tessera_cli::run(args).await
}
