use std::io::{self, Write};

mod cli;

#[allow(unused_must_use)]
fn main() {
    // We put as little as possible into this function so the rest stays
    // reachable from in-process tests.

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    let mut cli = cli::Cli {
        arg_matches: cli::app().get_matches(),
        stdout: &mut stdout,
    };

    let r = cli.run();

    cli.flush();
    // Intentionally ignoring the result of this flush.

    std::process::exit(match r {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("ERROR: {}", err);
            err.exit_code()
        }
    });
}
