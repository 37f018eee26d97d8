// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Args;
use tracing_subscriber::EnvFilter;

static INIT_LOGGER: std::sync::Once = std::sync::Once::new();

#[derive(Copy, Clone, Debug, Args)]
pub(crate) struct OutputOpts {
    /// Verbose output
    #[arg(long, short, global = true, env = "VERDICT_VERBOSE")]
    pub(crate) verbose: bool,
}

impl OutputOpts {
    /// Initializes logging. `VERDICT_LOG` overrides the default filter.
    pub(crate) fn init(self) {
        INIT_LOGGER.call_once(|| {
            let default_filter = if self.verbose { "debug" } else { "info" };
            let filter = EnvFilter::try_from_env("VERDICT_LOG")
                .unwrap_or_else(|_| EnvFilter::new(default_filter));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time()
                .init();
        });
    }
}
