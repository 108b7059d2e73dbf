/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use clap::Parser;
use eft::{Engine, EngineCommand};

fn main() {
    let mut engine = Engine::new();

    // A command supplied on the command line (like `bench`) runs before the
    // input loop starts.
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if !args.is_empty() {
        match EngineCommand::try_parse_from(&args) {
            Ok(cmd) => {
                engine.send_command(cmd);
                engine.send_command(EngineCommand::Exit { cleanup: true });
            }
            Err(e) => {
                eprintln!("{e}");
                return;
            }
        }
    }

    if let Err(e) = engine.run() {
        eprintln!("{} encountered an error: {e}", env!("CARGO_PKG_NAME"));
    }
}
