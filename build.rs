// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn package_path() -> Arg {
    Arg::new("package_path")
        .required(true)
        .value_name("PATH")
        .help("Path to the package file")
}

fn build_cli() -> Command {
    Command::new("unipkg")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Unipkg Contributors")
        .about("Install, remove and inspect deb, rpm, eopkg, pacman and apk packages")
        .subcommand_required(false)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_name("FILE")
                .help("Configuration file (JSON), default /etc/unipkg/config.json"),
        )
        .arg(
            Arg::new("backup_dir")
                .short('b')
                .long("backup-dir")
                .global(true)
                .value_name("DIR")
                .help("Directory for pre-operation backups, default /var/backups/unipkg"),
        )
        .subcommand(
            Command::new("install")
                .about("Install a package file with its native package manager")
                .arg(package_path())
                .arg(
                    Arg::new("force")
                        .short('f')
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Ignore dependency and safety checks"),
                ),
        )
        .subcommand(
            Command::new("remove")
                .about("Remove a package, given its package file or its installed name")
                .arg(
                    Arg::new("package")
                        .required(true)
                        .value_name("PACKAGE")
                        .help("Path to a package file, or the name of an installed package"),
                )
                .arg(
                    Arg::new("purge")
                        .short('p')
                        .long("purge")
                        .action(ArgAction::SetTrue)
                        .help("Also remove configuration, caches and unneeded dependencies"),
                ),
        )
        .subcommand(
            Command::new("info")
                .about("Show package metadata")
                .arg(package_path())
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print metadata as JSON"),
                ),
        )
        .subcommand(
            Command::new("detect")
                .about("Print the format detected from a file name")
                .arg(package_path()),
        )
        .subcommand(
            Command::new("hash")
                .about("Print the SHA-256 digest of a file")
                .arg(Arg::new("path").required(true).help("Path to the file")),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a package signature with the native tool")
                .arg(package_path()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("unipkg.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
