// tests/integration_test.rs

//! Integration tests for unipkg
//!
//! Native tools are replaced by a scripted runner so install and remove
//! flows can be checked end to end without touching the host.

use flate2::Compression;
use flate2::write::GzEncoder;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use unipkg::command::{CommandOutput, CommandRunner};
use unipkg::config::Config;
use unipkg::context::Context;
use unipkg::format::PackageFormat;
use unipkg::packages;
use unipkg::privilege::PrivilegeGate;
use unipkg::ErrorKind;

type Script = Box<dyn Fn(&str, &[String]) -> io::Result<CommandOutput> + Send + Sync>;

/// Records every invocation and answers from a script
struct ScriptedRunner {
    calls: Mutex<Vec<String>>,
    script: Script,
}

impl ScriptedRunner {
    fn new<F>(script: F) -> Arc<Self>
    where
        F: Fn(&str, &[String]) -> io::Result<CommandOutput> + Send + Sync + 'static,
    {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            script: Box::new(script),
        })
    }

    fn succeeding() -> Arc<Self> {
        Self::new(|_, _| Ok(CommandOutput::success("")))
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[OsString]) -> io::Result<CommandOutput> {
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let mut line = program.to_string();
        for arg in &args {
            line.push(' ');
            line.push_str(arg);
        }
        self.calls.lock().unwrap().push(line);

        (self.script)(program, &args)
    }
}

/// Scratch area with a fake package database and a backup root
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        std::fs::create_dir_all(state.join("info")).unwrap();
        std::fs::write(state.join("status"), "Package: base-files\n").unwrap();
        std::fs::write(state.join("info/base-files.list"), "/etc/issue\n").unwrap();
        Self { dir }
    }

    fn backup_root(&self) -> PathBuf {
        self.dir.path().join("backups")
    }

    fn config(&self) -> Config {
        let mut config = Config::default().with_backup_root(self.backup_root());
        let state = self.dir.path().join("state");
        config.state.dpkg = state.clone();
        config.state.rpm = state.clone();
        config.state.eopkg = state.clone();
        config.state.pacman = state.clone();
        config.state.apk = state.join("status");
        config
    }

    fn context(&self, runner: Arc<ScriptedRunner>, root: bool) -> Context {
        Context::new(self.config())
            .with_runner(runner)
            .with_privilege(PrivilegeGate::Fixed(root))
    }

    fn write(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn backups(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.backup_root()) {
            Ok(entries) => entries.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

const DEB_MAGIC: &[u8] = b"!<arch>\ndebian-binary   ";
const RPM_MAGIC: &[u8] = &[0xed, 0xab, 0xee, 0xdb, 0x03, 0x00, 0x00, 0x00];

const CONTROL: &str = "\
Package: hello
Version: 2.10-3
Architecture: amd64
Maintainer: Santiago Vila <sanvila@debian.org>
Installed-Size: 280
Depends: libc6 (>= 2.34)
Section: devel
Priority: optional
Description: example package based on GNU hello
 The GNU hello program produces a familiar, friendly greeting.
";

const RPM_QUERY: &str = "\
Name        : hello
Version     : 2.12.1
Release     : 4.fc40
Architecture: x86_64
Size        : 187351
License     : GPL-3.0-or-later
Summary     : Prints a familiar, friendly greeting
Description :
The GNU Hello program produces a familiar, friendly greeting.
";

fn tar_with(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in members {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// A minimal but well-formed .deb: debian-binary, control.tar.gz, data.tar.gz
fn build_deb(control: &str) -> Vec<u8> {
    let control_tar = gzip(&tar_with(&[("./control", control.as_bytes())]));
    let data_tar = gzip(&tar_with(&[("./usr/bin/hello", b"#!/bin/sh\n")]));

    let mut builder = ar::Builder::new(Vec::new());
    for (name, data) in [
        ("debian-binary", &b"2.0\n"[..]),
        ("control.tar.gz", &control_tar[..]),
        ("data.tar.gz", &data_tar[..]),
    ] {
        let header = ar::Header::new(name.as_bytes().to_vec(), data.len() as u64);
        builder.append(&header, data).unwrap();
    }
    builder.into_inner().unwrap()
}

#[test]
fn test_install_without_root_has_no_side_effects() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), false);

    for (name, content) in [
        ("hello_2.10-3_amd64.deb", DEB_MAGIC),
        ("hello-2.12.1-4.fc40.x86_64.rpm", RPM_MAGIC),
    ] {
        let path = fixture.write(name, content);
        let mut package = packages::open(&path, &ctx).unwrap();

        let err = package.install(false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(err.format(), package.format());

        let err = package.remove(true).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    }

    assert!(runner.calls().is_empty());
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_deb_install_success() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    package.install(true).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            format!("dpkg -i --force-all {}", path.display()),
            "apt-get update".to_string(),
        ]
    );

    let backups = fixture.backups();
    assert_eq!(backups.len(), 1);
    let name = backups[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("state-"), "unexpected backup name {}", name);
    assert!(name.ends_with(".tar.gz"));
}

#[test]
fn test_deb_install_repaired_by_apt() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| match program {
        "dpkg" => Ok(CommandOutput::failure(1, "dependency problems - leaving unconfigured")),
        _ => Ok(CommandOutput::success("")),
    });
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    package.install(false).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            format!("dpkg -i {}", path.display()),
            "apt-get install -f -y".to_string(),
        ]
    );
}

#[test]
fn test_deb_install_repair_failure_reports_both_outputs() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| match program {
        "dpkg" => Ok(CommandOutput::failure(1, "dpkg: dependency problems")),
        _ => Ok(CommandOutput::failure(100, "E: Unmet dependencies")),
    });
    let ctx = fixture.context(runner, true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    let err = package.install(false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SubprocessFailure);
    assert_eq!(err.format(), PackageFormat::Debian);
    assert!(err.message().contains("dpkg: dependency problems"));
    assert!(err.message().contains("E: Unmet dependencies"));
}

#[test]
fn test_deb_remove_resolves_name_from_info() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, args| {
        if program == "dpkg-deb" && args.first().map(String::as_str) == Some("-f") {
            Ok(CommandOutput::success(CONTROL))
        } else {
            Ok(CommandOutput::success(""))
        }
    });
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    package.remove(true).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            format!("dpkg-deb -f {}", path.display()),
            "dpkg --purge hello".to_string(),
            "apt-get autoremove -y".to_string(),
            "apt-get clean".to_string(),
        ]
    );
    assert_eq!(package.display_name(), "hello_2.10-3_amd64.deb");
}

#[test]
fn test_remove_aborts_when_info_fails() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| match program {
        "dpkg-deb" => Ok(CommandOutput::failure(2, "dpkg-deb: error: not a Debian archive")),
        _ => Ok(CommandOutput::success("")),
    });
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("broken_1.0_all.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    let err = package.remove(false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::SubprocessFailure);
    assert_eq!(err.message(), "failed to get package info");
    assert!(runner.calls().iter().all(|call| !call.starts_with("dpkg ")));
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_deb_info_reads_archive_without_dpkg_deb() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| {
        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{}: command not found", program),
        ))
    });
    let ctx = fixture.context(runner, false);
    let path = fixture.write("hello_2.10-3_amd64.deb", &build_deb(CONTROL));

    let mut package = packages::open(&path, &ctx).unwrap();
    let meta = package.info().unwrap();

    assert_eq!(meta.name, "hello");
    assert_eq!(meta.version, "2.10-3");
    assert_eq!(meta.size, 280 * 1024);
    assert_eq!(meta.dependencies, vec!["libc6"]);
    assert_eq!(
        meta.description,
        "example package based on GNU hello\nThe GNU hello program produces a familiar, friendly greeting."
    );
}

#[test]
fn test_info_is_cached() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::success(CONTROL)));
    let ctx = fixture.context(runner.clone(), false);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    let first = package.info().unwrap().clone();
    let second = package.info().unwrap().clone();

    assert_eq!(first, second);
    assert_eq!(runner.calls().len(), 1);
}

fn rpm_runner(installed: bool) -> Arc<ScriptedRunner> {
    ScriptedRunner::new(move |_, args| {
        match args.first().map(String::as_str) {
            Some("-qip") => Ok(CommandOutput::success(RPM_QUERY)),
            Some("-qpR") => Ok(CommandOutput::success("glibc >= 2.38\nrpmlib(PayloadIsZstd) <= 5.4.18-1\n")),
            Some("-q") if !installed => Ok(CommandOutput::failure(1, "package hello is not installed")),
            _ => Ok(CommandOutput::success("")),
        }
    })
}

#[test]
fn test_rpm_install_verification_failure() {
    let fixture = Fixture::new();
    let runner = rpm_runner(false);
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello-2.12.1-4.fc40.x86_64.rpm", RPM_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    let err = package.install(false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VerificationFailure);
    assert_eq!(err.format(), PackageFormat::Rpm);

    let calls = runner.calls();
    assert_eq!(calls[0], format!("rpm -i {}", path.display()));
    assert_eq!(calls.last().unwrap(), "rpm -q hello");
}

#[test]
fn test_rpm_install_success_with_metadata() {
    let fixture = Fixture::new();
    let runner = rpm_runner(true);
    let ctx = fixture.context(runner, true);
    let path = fixture.write("hello-2.12.1-4.fc40.x86_64.rpm", RPM_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    package.install(true).unwrap();

    let meta = package.info().unwrap();
    assert_eq!(meta.version, "2.12.1-4.fc40");
    assert_eq!(meta.dependencies, vec!["glibc"]);
    assert_eq!(package.display_name(), "hello-2.12.1-4.fc40.rpm");
}

#[test]
fn test_rpm_remove_fails_if_still_installed() {
    let fixture = Fixture::new();
    let runner = rpm_runner(true);
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello-2.12.1-4.fc40.x86_64.rpm", RPM_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    let err = package.remove(false).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::VerificationFailure);
    assert!(runner.calls().contains(&"rpm -e --nodeps hello".to_string()));
}

#[test]
fn test_pacman_commands() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), true);

    let pkginfo = "pkgname = hello\npkgver = 2.12.1-1\narch = x86_64\n";
    let archive = zstd::encode_all(&tar_with(&[(".PKGINFO", pkginfo.as_bytes())])[..], 3).unwrap();
    let path = fixture.write("hello-2.12.1-1-x86_64.pkg.tar.zst", &archive);

    let mut package = packages::open(&path, &ctx).unwrap();
    assert_eq!(package.format(), PackageFormat::Arch);

    package.install(true).unwrap();
    package.remove(true).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            format!("pacman -U --force --nodeps {}", path.display()),
            "pacman -Sy".to_string(),
            "pacman -R -n -s hello".to_string(),
            "pacman -Scc --noconfirm".to_string(),
        ]
    );
    assert_eq!(package.display_name(), "hello-2.12.1-1-x86_64.pkg.tar.*");
}

#[test]
fn test_apk_and_eopkg_commands() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), true);

    let apk = gzip(&tar_with(&[(
        ".PKGINFO",
        b"pkgname=hello\npkgver=2.12.1-r1\narch=x86_64\n",
    )]));
    let apk_path = fixture.write("hello-2.12.1-r1.apk", &apk);

    let mut package = packages::open(&apk_path, &ctx).unwrap();
    package.install(true).unwrap();
    package.remove(true).unwrap();

    let metadata = br#"<PISI>
  <Package><Name>hello</Name><Summary>Greeting</Summary></Package>
  <History><Update release="1"><Date>2024-02-01</Date><Version>2.12.1</Version></Update></History>
</PISI>"#;
    let eopkg = gzip(&tar_with(&[("metadata.xml", &metadata[..])]));
    let eopkg_path = fixture.write("hello-2.12.1-1-1-x86_64.eopkg", &eopkg);

    let mut package = packages::open(&eopkg_path, &ctx).unwrap();
    package.install(false).unwrap();
    package.remove(true).unwrap();

    assert_eq!(
        runner.calls(),
        vec![
            format!("apk add --force-overwrite {}", apk_path.display()),
            "apk del --purge hello".to_string(),
            format!("eopkg install {}", eopkg_path.display()),
            "eopkg index --rebuild-db".to_string(),
            "eopkg remove --purge hello".to_string(),
            "eopkg delete-cache".to_string(),
        ]
    );
}

#[test]
fn test_backups_can_be_disabled() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let mut config = fixture.config();
    config.create_backups = false;
    let ctx = Context::new(config)
        .with_runner(runner)
        .with_privilege(PrivilegeGate::Fixed(true));
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    packages::open(&path, &ctx).unwrap().install(false).unwrap();
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_follow_up_failure_is_not_fatal() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| match program {
        "apt-get" => Ok(CommandOutput::failure(100, "E: Could not get lock")),
        _ => Ok(CommandOutput::success("")),
    });
    let ctx = fixture.context(runner, true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    packages::open(&path, &ctx).unwrap().install(false).unwrap();
}

#[test]
fn test_signature_verification() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|_, _| Ok(CommandOutput::failure(1, "NOT OK")));
    let ctx = fixture.context(runner.clone(), false);

    let rpm_path = fixture.write("hello-2.12.1-4.fc40.x86_64.rpm", RPM_MAGIC);
    let err = packages::open(&rpm_path, &ctx)
        .unwrap()
        .verify_signature()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VerificationFailure);
    assert_eq!(runner.calls(), vec![format!("rpm -K {}", rpm_path.display())]);

    let apk_path = fixture.write("hello-2.12.1-r1.apk", &gzip(b"x"));
    let err = packages::open(&apk_path, &ctx)
        .unwrap()
        .verify_signature()
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unsupported);
    assert_eq!(err.format(), PackageFormat::Alpine);
}

#[test]
fn test_open_rejects_bad_inputs() {
    let fixture = Fixture::new();
    let ctx = fixture.context(ScriptedRunner::succeeding(), true);

    let err = packages::open(fixture.write("notes.txt", b"hello"), &ctx).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Unsupported);

    let err = packages::open(Path::new("/nonexistent/hello.apk"), &ctx).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = packages::open(fixture.write("fake.rpm", b"!<arch>\n"), &ctx).err().unwrap();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_facade_checks_privilege_before_path() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), false);

    let err = packages::install("/nonexistent/hello_1.0_amd64.deb", false, &ctx)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    let err = packages::remove("/nonexistent/hello_1.0_amd64.deb", true, &ctx)
        .err()
        .unwrap();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);

    assert!(runner.calls().is_empty());
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_facade_install_runs_native_tool() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), true);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let package = packages::install(&path, false, &ctx).unwrap();
    assert_eq!(package.format(), PackageFormat::Debian);
    assert_eq!(runner.calls()[0], format!("dpkg -i {}", path.display()));
}

fn missing(program: &str) -> io::Result<CommandOutput> {
    Err(io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: command not found", program),
    ))
}

#[test]
fn test_remove_installed_finds_owning_tool() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, args| match program {
        "pacman" if args.first().map(String::as_str) == Some("-Q") => {
            Ok(CommandOutput::success("hello 2.12.1-1\n"))
        }
        "pacman" => Ok(CommandOutput::success("")),
        "rpm" => Ok(CommandOutput::failure(1, "package hello is not installed")),
        "dpkg" => Ok(CommandOutput::failure(1, "dpkg-query: package 'hello' is not installed")),
        _ => missing(program),
    });
    let ctx = fixture.context(runner.clone(), true);

    let format = packages::remove_installed("hello", true, &ctx).unwrap();
    assert_eq!(format, PackageFormat::Arch);

    assert_eq!(
        runner.calls(),
        vec![
            "dpkg -s hello",
            "rpm -q hello",
            "eopkg info hello",
            "pacman -Q hello",
            "pacman -R -n -s hello",
            "pacman -Scc --noconfirm",
        ]
    );
    assert_eq!(fixture.backups().len(), 1);
}

#[test]
fn test_remove_installed_deb_needs_installed_status() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, args| match (program, args.first().map(String::as_str)) {
        ("dpkg", Some("-s")) => Ok(CommandOutput::success(
            "Package: hello\nStatus: install ok installed\nVersion: 2.10-3\n",
        )),
        _ => Ok(CommandOutput::success("")),
    });
    let ctx = fixture.context(runner.clone(), true);

    let format = packages::remove_installed("hello", false, &ctx).unwrap();
    assert_eq!(format, PackageFormat::Debian);
    assert_eq!(
        runner.calls(),
        vec!["dpkg -s hello", "dpkg --remove hello", "apt-get autoremove -y"]
    );
}

#[test]
fn test_remove_installed_unknown_name() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| match program {
        // dpkg knows of the name but it was removed with its config kept
        "dpkg" => Ok(CommandOutput::success("Package: ghost\nStatus: deinstall ok config-files\n")),
        "eopkg" => Ok(CommandOutput::success("Package found in repository: ghost\n")),
        _ => missing(program),
    });
    let ctx = fixture.context(runner.clone(), true);

    let err = packages::remove_installed("ghost", false, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.format(), PackageFormat::Unknown);
    assert_eq!(runner.calls().len(), 5);
    assert!(fixture.backups().is_empty());
}

#[test]
fn test_remove_installed_requires_root() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::succeeding();
    let ctx = fixture.context(runner.clone(), false);

    let err = packages::remove_installed("hello", false, &ctx).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
    assert!(runner.calls().is_empty());
}

#[test]
fn test_rpm_info_parses_header_without_rpm_binary() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, _| missing(program));
    let ctx = fixture.context(runner, false);

    let built = rpm::PackageBuilder::new("hello", "2.12.1", "GPL-3.0-or-later", "x86_64", "greeting")
        .release("4")
        .requires(rpm::Dependency::any("glibc"))
        .build()
        .unwrap();
    let mut bytes = Vec::new();
    built.write(&mut bytes).unwrap();
    let path = fixture.write("hello-2.12.1-4.x86_64.rpm", &bytes);

    let mut package = packages::open(&path, &ctx).unwrap();
    let meta = package.info().unwrap();

    assert_eq!(meta.name, "hello");
    assert_eq!(meta.version, "2.12.1-4");
    assert!(meta.dependencies.iter().any(|d| d == "glibc"));
    assert!(
        meta.dependencies
            .iter()
            .all(|d| !d.starts_with("rpmlib(") && !d.starts_with('/')),
        "unfiltered dependencies: {:?}",
        meta.dependencies
    );
}

#[test]
fn test_deb_installed_size_from_info_report() {
    let fixture = Fixture::new();
    let runner = ScriptedRunner::new(|program, args| match (program, args.first().map(String::as_str)) {
        ("dpkg-deb", Some("-f")) => Ok(CommandOutput::success(
            "Package: hello\nVersion: 2.10-3\nArchitecture: amd64\n",
        )),
        ("dpkg-deb", Some("-I")) => Ok(CommandOutput::success(
            " new Debian package, version 2.0.\n size 53320 bytes: control archive=1868 bytes.\n Package: hello\n Installed-Size: 512\n",
        )),
        _ => Ok(CommandOutput::success("")),
    });
    let ctx = fixture.context(runner.clone(), false);
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    let mut package = packages::open(&path, &ctx).unwrap();
    assert_eq!(package.info().unwrap().size, 512 * 1024);
    assert_eq!(
        runner.calls(),
        vec![
            format!("dpkg-deb -f {}", path.display()),
            format!("dpkg-deb -I {}", path.display()),
        ]
    );
}

#[test]
fn test_backup_retention_prunes_old_archives() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.backup_root()).unwrap();
    for stamp in ["20200101-000000", "20200102-000000", "20200103-000000"] {
        std::fs::write(fixture.backup_root().join(format!("state-{}.tar.gz", stamp)), b"").unwrap();
    }

    let mut config = fixture.config();
    config.backup_retention = 2;
    let runner = ScriptedRunner::succeeding();
    let ctx = Context::new(config)
        .with_runner(runner)
        .with_privilege(PrivilegeGate::Fixed(true));
    let path = fixture.write("hello_2.10-3_amd64.deb", DEB_MAGIC);

    packages::install(&path, false, &ctx).unwrap();

    let mut names: Vec<String> = fixture
        .backups()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names.len(), 2);
    assert_eq!(names[0], "state-20200103-000000.tar.gz");
    assert!(!names[1].starts_with("state-2020"));
}
