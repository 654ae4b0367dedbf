//! Built-in provider endpoints.

use chainstate_types::{Miner, MinerApi};

/// Block explorer used when no `[explorer]` section is configured.
pub const DEFAULT_EXPLORER_URL: &str = "https://api.whatsonchain.com/v1/bsv";

/// Miners used when a miner list is not overridden in configuration.
pub fn default_miners() -> Vec<Miner> {
	vec![
		Miner::new(
			"03e92d3e5c3f7bd945dfbf48e7a99393b1bfb3f11f380ae30d286e7ff2aec5a270",
			"Taal",
			"https://merchantapi.taal.com",
		),
		Miner::new(
			"0211ccfc29e3058b770f3cf3eb34b0b2fd2293057a994d4d275121be4151cdf087",
			"Mempool",
			"https://merchantapi.matterpool.io",
		),
		Miner::new(
			"03ad780153c47df915b3d2e23af727c68facaf4fcf8c9a1ab2b8b3f8b4a3e0aac8",
			"GorillaPool",
			"https://arc.gorillapool.io",
		)
		.with_api(MinerApi::Arc),
	]
}
