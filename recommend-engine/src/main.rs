use clap::Parser;

use recommend_engine::config::CliArgs;
use recommend_engine::server::RecommendServer;
use recommend_engine::strategy::RecommendEngine;
use recommend_engine::transport::NdjsonTransport;

fn main() {
	let args = CliArgs::parse();

	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let engine = RecommendEngine::new(args.engine_config());
	let mut server = RecommendServer::new(NdjsonTransport::new(), engine, args.seed);

	tracing::info!("recommend-engine ready");

	if let Err(e) = server.run() {
		tracing::error!("Server error: {}", e);
		std::process::exit(1);
	}
}
