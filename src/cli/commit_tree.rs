use std::env;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use super::{require_repo, Cli};

use mingit::object::commit::{encode_commit, Attribution};
use mingit::object::{Id, Kind, Object};
use mingit::{Error, ObjectStore, Result};

use clap::{App, Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("commit-tree")
        .about("Create a new commit object from a tree")
        .arg(Arg::with_name("tree").required(true))
        .arg(
            Arg::with_name("parent")
                .short("p")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("A parent commit (repeat for multiple parents)"),
        )
        .arg(
            Arg::with_name("message")
                .short("m")
                .takes_value(true)
                .required(true)
                .help("The commit message"),
        )
}

pub(crate) fn run(cli: &mut Cli, args: &ArgMatches) -> Result<()> {
    let tree = parse_id(args.value_of("tree").unwrap())?;

    let mut parents = Vec::new();
    if let Some(values) = args.values_of("parent") {
        for value in values {
            parents.push(parse_id(value)?);
        }
    }

    let mut message = args.value_of("message").unwrap().to_string();
    if !message.ends_with('\n') {
        message.push('\n');
    }

    let store = ObjectStore::new(&require_repo()?);
    if !store.contains(&tree) {
        return Err(Error::Object(format!("tree {} not found", tree)));
    }
    for parent in &parents {
        if !store.contains(parent) {
            return Err(Error::Object(format!("parent {} not found", parent)));
        }
    }

    let ident = attribution_from_env();
    let payload = encode_commit(&tree, &parents, &ident, &ident, &message);
    let id = store.write(&Object::new(Kind::Commit, payload))?;

    writeln!(cli, "{}", id)?;
    Ok(())
}

fn parse_id(value: &str) -> Result<Id> {
    value
        .parse()
        .map_err(|err| Error::Usage(format!("invalid object name {}: {}", value, err)))
}

// User configuration is out of scope, so the identity is built in and
// overridable through the environment, which also keeps commit IDs
// reproducible in tests.
fn attribution_from_env() -> Attribution {
    let name = env::var("MINGIT_AUTHOR_NAME").unwrap_or_else(|_| "mingit".to_string());
    let email = env::var("MINGIT_AUTHOR_EMAIL").unwrap_or_else(|_| "mingit@localhost".to_string());
    let timestamp = env::var("MINGIT_AUTHOR_DATE")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs() as i64)
                .unwrap_or(0)
        });

    Attribution::new(&name, &email, timestamp, 0)
}

#[cfg(test)]
mod tests {
    use super::super::Cli;

    #[test]
    fn error_missing_message() {
        let err = Cli::run_with_args(vec![
            "commit-tree",
            "4b825dc642cb6eb9a060e54bf8d69288fbee4904",
        ])
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("required arguments were not provided"));
    }

    #[test]
    fn error_invalid_tree_id() {
        let err =
            Cli::run_with_args(vec!["commit-tree", "not-a-tree", "-m", "msg"]).unwrap_err();
        assert!(err.to_string().contains("invalid object name"));
        assert_eq!(err.exit_code(), 1);
    }
}
