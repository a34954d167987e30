#![deny(warnings)]

use std::io::Write;

#[cfg(test)]
use std::ffi::OsString;

use mingit::{Error, Result};

use clap::{crate_version, App, AppSettings, ArgMatches};

mod cat_file;
mod clone;
mod commit_tree;
mod hash_object;
mod init;
mod write_tree;

pub(crate) fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("mingit")
        .version(crate_version!())
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .setting(AppSettings::VersionlessSubcommands)
        .subcommand(cat_file::subcommand())
        .subcommand(clone::subcommand())
        .subcommand(commit_tree::subcommand())
        .subcommand(hash_object::subcommand())
        .subcommand(init::subcommand())
        .subcommand(write_tree::subcommand())
}

pub(crate) struct Cli<'a> {
    pub arg_matches: ArgMatches<'a>,
    pub stdout: &'a mut dyn Write,
}

impl<'a> Cli<'a> {
    pub fn run(&mut self) -> Result<()> {
        let matches = self.arg_matches.clone();
        // ^^ Ugh. Need an independent copy of matches so we can still pass
        // the Cli struct through to subcommand imps.

        match matches.subcommand() {
            ("cat-file", Some(m)) => cat_file::run(self, m),
            ("clone", Some(m)) => clone::run(self, m),
            ("commit-tree", Some(m)) => commit_tree::run(self, m),
            ("hash-object", Some(m)) => hash_object::run(self, m),
            ("init", Some(m)) => init::run(self, m),
            ("write-tree", Some(m)) => write_tree::run(self, m),
            _ => unreachable!(),
            // unreachable: Should have exited out with appropriate help or
            // error message if no subcommand was given.
        }
    }

    #[cfg(test)]
    pub fn run_with_args<I, T>(args: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let mut args: Vec<OsString> = args.into_iter().map(|x| x.into()).collect();
        args.insert(0, OsString::from("mingit"));

        let mut stdout = Vec::new();

        Cli {
            arg_matches: app()
                .get_matches_from_safe(args)
                .map_err(|err| Error::Usage(err.to_string()))?,
            stdout: &mut stdout,
        }
        .run()?;

        Ok(stdout)
    }
}

impl<'a> Write for Cli<'a> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.stdout.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.stdout.flush()
    }
}

// The repository the object-database commands operate on: `.git` in the
// current working directory.
pub(crate) fn require_repo() -> Result<std::path::PathBuf> {
    let git_dir = std::path::PathBuf::from(".git");
    if git_dir.is_dir() {
        Ok(git_dir)
    } else {
        Err(Error::Usage(
            "not a mingit repository (no .git directory)".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use assert_cmd::Command;
    use predicates::prelude::*;

    #[test]
    fn no_subcommand_prints_help() {
        let mut cmd = Command::cargo_bin("mingit").unwrap();
        cmd.assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::starts_with("mingit 0."))
            .stderr(predicate::str::contains("USAGE:"));
    }

    #[test]
    fn version() {
        let mut cmd = Command::cargo_bin("mingit").unwrap();
        cmd.arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("mingit 0."))
            .stderr("");
    }
}
