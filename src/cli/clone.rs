use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::Cli;

use mingit::protocol::Remote;
use mingit::{checkout, pack, repo, Error, ObjectStore, Result};

use clap::{App, Arg, ArgMatches, SubCommand};

pub(crate) fn subcommand<'a, 'b>() -> App<'a, 'b> {
    SubCommand::with_name("clone")
        .about("Clone a repository over Smart HTTP into a new directory")
        .arg(Arg::with_name("url").required(true))
        .arg(Arg::with_name("directory").required(true))
}

pub(crate) fn run(_cli: &mut Cli, args: &ArgMatches) -> Result<()> {
    let url = args.value_of("url").unwrap();
    let dir = args.value_of("directory").unwrap();

    let dest = Path::new(dir);
    if dest.exists() && fs::read_dir(dest)?.next().is_some() {
        return Err(Error::Usage(format!(
            "destination path '{}' already exists and is not an empty directory",
            dir
        )));
    }

    let remote = Remote::new(url)?;
    let advertisement = remote.discover_refs()?;

    let branch = advertisement.default_branch().ok_or_else(|| {
        Error::Protocol("remote did not advertise a branch to check out".to_string())
    })?;
    let want = advertisement
        .refs
        .get(&branch)
        .copied()
        .or(advertisement.head)
        .ok_or_else(|| {
            Error::Protocol(format!("remote HEAD points at unadvertised ref {}", branch))
        })?;

    fs::create_dir_all(dest)?;
    repo::init(dest)?;
    let git_dir = dest.join(".git");
    repo::write_head_symref(&git_dir, &branch)?;

    let pack_bytes = remote.fetch_pack(&[want], &advertisement, |text| {
        let _ = io::stderr().write_all(text);
    })?;

    let store = ObjectStore::new(&git_dir);
    pack::decode_to_store(&store, &pack_bytes)?;

    repo::write_ref(&git_dir, &branch, &want)?;
    checkout::checkout_commit(&store, &want, dest)?;

    Ok(())
}
