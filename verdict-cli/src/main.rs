// Copyright (c) The verdict Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use clap::Parser;
use color_eyre::Result;
use verdict_cli::VerdictApp;

fn main() -> Result<()> {
    color_eyre::install()?;

    let app = VerdictApp::parse();
    match app.exec() {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            error.display_to_stderr();
            std::process::exit(error.process_exit_code())
        }
    }
}
