use std::fs;
use std::io::Write;

use super::{require_repo, Cli};

use mingit::object::{Kind, Object};
use mingit::{ObjectStore, Result};

use clap::{App, Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("hash-object")
        .about("Compute object ID and optionally create a blob from a file")
        .arg(
            Arg::with_name("w")
                .short("w")
                .help("Actually write the object into the object database"),
        )
        .arg(Arg::with_name("file").required(true))
}

pub(crate) fn run(cli: &mut Cli, args: &ArgMatches) -> Result<()> {
    let file = args.value_of("file").unwrap();
    let content = fs::read(file)?;
    let blob = Object::new(Kind::Blob, content);

    let id = if args.is_present("w") {
        let store = ObjectStore::new(&require_repo()?);
        store.write(&blob)?
    } else {
        blob.id()
    };

    write!(cli, "{}", id)?;
    Ok(())
}
