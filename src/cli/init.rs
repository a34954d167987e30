use std::fs;
use std::io::Write;
use std::path::Path;

use super::Cli;

use mingit::{repo, Result};

use clap::{App, Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("init")
        .about("Create an empty git repository")
        .arg(
            Arg::with_name("directory")
                .help("The directory to create the repository in (defaults to the current directory)"),
        )
}

pub(crate) fn run(cli: &mut Cli, init_matches: &ArgMatches) -> Result<()> {
    let dir = init_matches.value_of("directory").unwrap_or(".");

    let path = Path::new(dir);
    fs::create_dir_all(path)?;
    repo::init(path)?;

    writeln!(
        cli,
        "Initialized empty Git repository in {}",
        path.display()
    )?;

    Ok(())
}
