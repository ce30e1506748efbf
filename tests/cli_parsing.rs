use std::path::PathBuf;

use clap::Parser;
use voletc::cli::{Cli, Commands};

#[test]
fn test_parse_ls_with_globals() {
    let cli = Cli::try_parse_from([
        "voletc",
        "-H",
        "consul://10.0.0.5:8500",
        "--prefix",
        "cfg",
        "--json",
        "ls",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Ls));
    assert_eq!(cli.global.backend.as_deref(), Some("consul://10.0.0.5:8500"));
    assert_eq!(cli.global.prefix.as_deref(), Some("cfg"));
    assert!(cli.global.json);
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["voletc", "info", "app-1-dev", "-e", "0123456789abcdef"]).unwrap();

    match cli.command {
        Commands::Info(args) => assert_eq!(args.name, "app-1-dev"),
        other => panic!("Wrong command: {other:?}"),
    }
    assert_eq!(cli.global.encryption_key.as_deref(), Some("0123456789abcdef"));
}

#[test]
fn test_parse_create() {
    let cli = Cli::try_parse_from([
        "voletc",
        "create",
        "app-1-dev",
        "db/host=10.0.0.1",
        "template:app.json=./app.json",
        "--dry-run",
    ])
    .unwrap();

    match cli.command {
        Commands::Create(args) => {
            assert_eq!(args.name, "app-1-dev");
            assert_eq!(args.pairs, vec!["db/host=10.0.0.1", "template:app.json=./app.json"]);
            assert!(args.dry_run);
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_edit_requires_pairs() {
    assert!(Cli::try_parse_from(["voletc", "edit", "app-1-dev"]).is_err());
    assert!(Cli::try_parse_from(["voletc", "edit", "app-1-dev", "k=v"]).is_ok());
}

#[test]
fn test_parse_rm_flags() {
    let cli = Cli::try_parse_from(["voletc", "rm", "app-1-dev", "-y", "--purge-templates"]).unwrap();
    match cli.command {
        Commands::Rm(args) => {
            assert!(args.yes);
            assert!(args.purge_templates);
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_parse_generate_and_serve() {
    let cli = Cli::try_parse_from(["voletc", "generate", "app-1-dev", "/tmp/out"]).unwrap();
    match cli.command {
        Commands::Generate(args) => assert_eq!(args.dir, PathBuf::from("/tmp/out")),
        other => panic!("Wrong command: {other:?}"),
    }

    let cli = Cli::try_parse_from(["voletc", "serve", "--listen", "0.0.0.0:9000", "--dir", "/mnt"]).unwrap();
    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.listen.as_deref(), Some("0.0.0.0:9000"));
            assert_eq!(args.dir, Some(PathBuf::from("/mnt")));
        }
        other => panic!("Wrong command: {other:?}"),
    }
}

#[test]
fn test_missing_subcommand_fails() {
    assert!(Cli::try_parse_from(["voletc"]).is_err());
}
