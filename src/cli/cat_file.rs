use std::io::Write;

use super::{require_repo, Cli};

use mingit::object::Id;
use mingit::{Error, ObjectStore, Result};

use clap::{App, Arg, ArgGroup, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("cat-file")
        .about("Provide content, type, or size information for a repository object")
        .arg(
            Arg::with_name("p")
                .short("p")
                .help("Pretty-print the contents of the object"),
        )
        .arg(Arg::with_name("t").short("t").help("Show the object type"))
        .arg(Arg::with_name("s").short("s").help("Show the object size"))
        .group(
            ArgGroup::with_name("mode")
                .args(&["p", "t", "s"])
                .required(true),
        )
        .arg(Arg::with_name("object").required(true))
}

pub(crate) fn run(cli: &mut Cli, args: &ArgMatches) -> Result<()> {
    let object_arg = args.value_of("object").unwrap();
    let id: Id = object_arg
        .parse()
        .map_err(|err| Error::Usage(format!("invalid object name {}: {}", object_arg, err)))?;

    let store = ObjectStore::new(&require_repo()?);
    let object = store.read(&id)?;

    if args.is_present("t") {
        writeln!(cli, "{}", object.kind)?;
    } else if args.is_present("s") {
        writeln!(cli, "{}", object.len())?;
    } else {
        cli.write_all(&object.content)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::Cli;

    #[test]
    fn error_requires_a_mode() {
        let err = Cli::run_with_args(vec![
            "cat-file",
            "b6fc4c620b67d95f953a5c1c1230aaab5db5a1b0",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("required arguments were not provided"));
    }

    #[test]
    fn error_invalid_object_name() {
        let err = Cli::run_with_args(vec!["cat-file", "-t", "not-a-sha"]).unwrap_err();
        assert!(err.to_string().contains("invalid object name"));
        assert_eq!(err.exit_code(), 1);
    }
}
