// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

use opcsh_bin::error::report_error_and_exit;
use opcsh_bin::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = opcsh_bin::commands::execute(cli).await {
        report_error_and_exit(e);
    }
}
