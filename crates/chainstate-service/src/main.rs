//! Command-line front end for the chainstate engine.
//!
//! Loads a configuration file, wires the HTTP provider clients into a
//! [`ChainstateClient`] and runs one operation per invocation, printing the
//! result as JSON.

use chainstate_config::Config;
use chainstate_core::{ChainstateBuilder, ChainstateClient, ChainstateError, FirstSuccess};
use chainstate_providers::implementations::{
	explorer::create_explorer, merkle::create_merkle_clients, miner::HttpMinerClient,
	node_proxy::create_node_proxy,
};
use chainstate_types::{Fee, MerkleRootConfirmationRequest, Miner, Network, RequiredIn};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Command-line arguments for the chainstate tool.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	#[command(subcommand)]
	command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Broadcast a raw transaction through every active provider
	Broadcast {
		/// Transaction id
		#[arg(long)]
		id: String,
		/// Raw transaction, hex encoded
		#[arg(long)]
		hex: String,
	},
	/// Look up a transaction
	Query {
		#[arg(long)]
		id: String,
		/// Minimum inclusion level: mempool or onchain
		#[arg(long)]
		required_in: String,
		/// Ask every provider at once and take the first answer
		#[arg(long)]
		fastest: bool,
	},
	/// Verify merkle roots against the configured verification services
	Verify {
		/// Root to verify, as <merkle_root>:<block_height>
		#[arg(long = "root", value_parser = parse_root, required = true)]
		roots: Vec<MerkleRootConfirmationRequest>,
	},
	/// Show the miners that passed the health check and the selected fee
	Miners,
}

#[derive(Debug, Serialize)]
struct BroadcastOutput<'a> {
	id: &'a str,
	accepted: bool,
	first_provider: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct VerifyOutput {
	roots: usize,
	confirmed: bool,
}

#[derive(Debug, Serialize)]
struct MinersOutput {
	network: Network,
	fee_unit: Fee,
	broadcast_miners: Vec<Miner>,
	query_miners: Vec<Miner>,
}

/// Main entry point for the chainstate tool.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the client, which health-checks the miners
/// 5. Runs the requested operation
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();

	let config = Config::from_file(&args.config).await?;
	tracing::info!(
		network = %config.network,
		path = %args.config.display(),
		"Loaded configuration"
	);

	let client = build_client(config).await?;
	run(&client, args.command).await?;
	Ok(())
}

/// Creates the HTTP provider clients described by `config` and builds the
/// engine client from them.
async fn build_client(config: Config) -> Result<ChainstateClient, ChainstateError> {
	let http = reqwest::Client::builder()
		.user_agent(concat!("chainstate/", env!("CARGO_PKG_VERSION")))
		.build()
		.map_err(|e| ChainstateError::Config(format!("HTTP client: {}", e)))?;

	let explorer = create_explorer("explorer", &config.explorer, config.network).with_client(http.clone());
	let mut builder = ChainstateBuilder::new(config.clone())
		.with_miner_client(Arc::new(HttpMinerClient::with_client(http.clone())))
		.with_explorer(Arc::new(explorer));

	if let Some(section) = &config.secondary_explorer {
		let secondary =
			create_explorer("secondary_explorer", section, config.network).with_client(http.clone());
		builder = builder.with_secondary_explorer(Arc::new(secondary));
	}
	if let Some(section) = &config.node_proxy {
		match create_node_proxy("node_proxy", section) {
			Ok(proxy) => builder = builder.with_node_proxy(Arc::new(proxy.with_client(http.clone()))),
			Err(e) => tracing::debug!(error = %e, "Node proxy inactive"),
		}
	}
	for verifier in create_merkle_clients(&config.merkle_verifiers) {
		builder = builder.with_merkle_verifier(Arc::new(verifier.with_client(http.clone())));
	}

	builder.build().await
}

async fn run(client: &ChainstateClient, command: Command) -> Result<(), Box<dyn std::error::Error>> {
	let config = client.config();
	match command {
		Command::Broadcast { id, hex } => {
			let first_success = Arc::new(FirstSuccess::new());
			client
				.broadcast_observed(&id, &hex, config.broadcast_timeout(), first_success.clone())
				.await?;
			print_json(&BroadcastOutput {
				id: &id,
				accepted: true,
				first_provider: first_success.get(),
			})
		}
		Command::Query {
			id,
			required_in,
			fastest,
		} => {
			let required_in = required_in
				.parse::<RequiredIn>()
				.map_err(ChainstateError::from)?;
			let info = if fastest {
				client
					.query_transaction_fastest(&id, required_in, config.query_timeout())
					.await?
			} else {
				client
					.query_transaction(&id, required_in, config.query_timeout())
					.await?
			};
			print_json(&info)
		}
		Command::Verify { roots } => {
			let count = roots.len();
			client.verify_merkle_roots(roots).await?;
			print_json(&VerifyOutput {
				roots: count,
				confirmed: true,
			})
		}
		Command::Miners => print_json(&MinersOutput {
			network: client.network(),
			fee_unit: client.fee_unit(),
			broadcast_miners: client.broadcast_miners(),
			query_miners: client.query_miners(),
		}),
	}
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
	println!("{}", serde_json::to_string_pretty(value)?);
	Ok(())
}

/// Parses `<merkle_root>:<block_height>`.
fn parse_root(value: &str) -> Result<MerkleRootConfirmationRequest, String> {
	let (root, height) = value
		.rsplit_once(':')
		.ok_or_else(|| format!("expected <merkle_root>:<block_height>, got '{}'", value))?;
	if !chainstate_types::is_hex(root) {
		return Err(format!("merkle root '{}' is not hex", root));
	}
	let height = height
		.parse::<u64>()
		.map_err(|e| format!("invalid block height '{}': {}", height, e))?;
	Ok(MerkleRootConfirmationRequest::new(root, height))
}

#[cfg(test)]
mod tests {
	use super::*;
	use chainstate_config::{EndpointConfig, MerkleVerifierConfig};
	use chainstate_types::{ProviderFamily, SecretString};
	use tempfile::tempdir;

	#[test]
	fn test_args_default_values() {
		let args = Args::try_parse_from(["chainstate", "miners"]).unwrap();

		assert_eq!(args.config, PathBuf::from("config.toml"));
		assert_eq!(args.log_level, "info");
		assert!(matches!(args.command, Command::Miners));
	}

	#[test]
	fn test_args_query() {
		let args = Args::try_parse_from([
			"chainstate",
			"--config",
			"custom.toml",
			"query",
			"--id",
			"abcd",
			"--required-in",
			"onchain",
			"--fastest",
		])
		.unwrap();

		assert_eq!(args.config, PathBuf::from("custom.toml"));
		match args.command {
			Command::Query {
				id,
				required_in,
				fastest,
			} => {
				assert_eq!(id, "abcd");
				assert_eq!(required_in, "onchain");
				assert!(fastest);
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_args_verify_roots() {
		let args = Args::try_parse_from([
			"chainstate",
			"verify",
			"--root",
			"aa01:100",
			"--root",
			"bb02:101",
		])
		.unwrap();

		match args.command {
			Command::Verify { roots } => {
				assert_eq!(roots.len(), 2);
				assert_eq!(roots[1], MerkleRootConfirmationRequest::new("bb02", 101));
			}
			other => panic!("unexpected command: {:?}", other),
		}
	}

	#[test]
	fn test_verify_requires_a_root() {
		assert!(Args::try_parse_from(["chainstate", "verify"]).is_err());
	}

	#[test]
	fn test_parse_root_errors() {
		assert!(parse_root("aa01").is_err());
		assert!(parse_root("zz:1").is_err());
		assert!(parse_root("aa01:tall").is_err());
		assert!(parse_root(":5").is_err());
	}

	#[tokio::test]
	async fn test_build_client_without_miners() {
		let mut config = Config::default();
		config.network = Network::StressTestNet;

		let client = build_client(config).await.unwrap();
		assert_eq!(client.network(), Network::StressTestNet);
		assert_eq!(client.fee_unit(), chainstate_types::DEFAULT_FEE);
	}

	#[tokio::test]
	async fn test_build_client_with_every_provider_section() {
		let mut config = Config::default();
		config.network = Network::StressTestNet;
		config.node_proxy = Some(EndpointConfig {
			url: "https://node.example".to_string(),
			api_key: None,
		});
		config.merkle_verifiers = vec![MerkleVerifierConfig {
			url: "https://headers.example".to_string(),
			token: SecretString::from("secret"),
		}];

		assert!(build_client(config.clone()).await.is_ok());

		config.node_proxy = Some(EndpointConfig {
			url: "https://node.example".to_string(),
			api_key: Some(SecretString::from("node-key")),
		});
		assert!(build_client(config).await.is_ok());
	}

	#[tokio::test]
	async fn test_build_client_with_miners_excluded() {
		let mut config = Config::default();
		config.excluded_providers = vec![ProviderFamily::Miner];

		let client = build_client(config).await.unwrap();
		assert_eq!(client.broadcast_miners().len(), 3);
	}

	#[test]
	fn test_load_config_file() {
		let temp_dir = tempdir().unwrap();
		let config_path = temp_dir.path().join("chainstate.toml");
		std::fs::write(
			&config_path,
			r#"
network = "test"
excluded_providers = ["node_proxy"]
query_timeout_seconds = 15

[explorer]
url = "https://explorer.example/v1/bsv"

[[merkle_verifiers]]
url = "https://headers.example"
token = "secret"
"#,
		)
		.unwrap();

		let config = tokio_test::block_on(Config::from_file(&config_path)).unwrap();
		assert_eq!(config.network, Network::TestNet);
		assert_eq!(config.query_timeout_seconds, 15);
		assert!(config.is_excluded(ProviderFamily::NodeProxy));
		assert_eq!(config.merkle_verifiers.len(), 1);
	}

	#[test]
	fn test_miners_output_hides_tokens() {
		let output = MinersOutput {
			network: Network::MainNet,
			fee_unit: Fee::new(1, 20),
			broadcast_miners: vec![Miner::new("t", "Taal", "https://taal.example").with_token("secret-token")],
			query_miners: Vec::new(),
		};
		let json = serde_json::to_string(&output).unwrap();
		assert!(json.contains("Taal"));
		assert!(!json.contains("secret-token"));
	}
}
