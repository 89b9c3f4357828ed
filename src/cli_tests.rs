use clap::Parser;

use super::{CatSubcommands, Cli, Commands};

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).expect("arguments should parse")
}

#[test]
fn add_parses_tags_and_guide_flag() {
    let cli = parse(&[
        "pdk", "add", "Sort", "-c", "sort things", "-k", "programming", "-g", "code", "-g",
        "tools", "--guide",
    ]);
    let Commands::Add(args) = cli.command else {
        panic!("expected add command");
    };
    assert_eq!(args.title, "Sort");
    assert_eq!(args.category.as_deref(), Some("programming"));
    assert_eq!(args.tags, vec!["code".to_string(), "tools".to_string()]);
    assert!(args.guide);
}

#[test]
fn edit_rejects_conflicting_guide_flags() {
    let result = Cli::try_parse_from(["pdk", "edit", "p1", "--guide", "--no-guide"]);
    assert!(result.is_err());
}

#[test]
fn edit_rejects_category_with_uncategorize() {
    let result = Cli::try_parse_from(["pdk", "edit", "p1", "-k", "x", "--uncategorize"]);
    assert!(result.is_err());
}

#[test]
fn db_path_defaults_and_overrides() {
    let cli = parse(&["pdk", "ls"]);
    assert_eq!(cli.db, ".promptdeck/state.sqlite");

    let cli = parse(&["pdk", "-d", "/tmp/deck.sqlite", "ls", "--json"]);
    assert_eq!(cli.db, "/tmp/deck.sqlite");
    let Commands::Ls(args) = cli.command else {
        panic!("expected ls command");
    };
    assert!(args.json);
}

#[test]
fn cat_subcommands_parse() {
    let cli = parse(&["pdk", "cat", "add", "编程", "-s", "1"]);
    let Commands::Cat(args) = cli.command else {
        panic!("expected cat command");
    };
    let CatSubcommands::Add(add) = args.command else {
        panic!("expected cat add");
    };
    assert_eq!(add.name, "编程");
    assert_eq!(add.sort_order, Some(1));

    let cli = parse(&["pdk", "cat", "list"]);
    let Commands::Cat(args) = cli.command else {
        panic!("expected cat command");
    };
    assert!(matches!(args.command, CatSubcommands::Ls(_)));
}

#[test]
fn reset_requires_no_positional_arguments() {
    let cli = parse(&["pdk", "reset", "--force"]);
    let Commands::Reset(args) = cli.command else {
        panic!("expected reset command");
    };
    assert!(args.force);
}
