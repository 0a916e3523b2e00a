use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_run_with_target_version() {
    let cli = Cli::try_parse_from(["sw", "--verbose", "run", "--to", "6.2.alpha1"]).unwrap();
    assert!(cli.global.verbose);
    match cli.command {
        Commands::Run(args) => {
            assert_eq!(args.to.as_deref(), Some("6.2.alpha1"));
            assert!(!args.no_progress);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["sw", "status", "-p", "/srv/crm", "--target", "prod"]).unwrap();
    assert_eq!(cli.global.project_dir, "/srv/crm");
    assert_eq!(cli.global.target.as_deref(), Some("prod"));
    assert!(matches!(cli.command, Commands::Status));
}

#[test]
fn test_plan_defaults_to_latest() {
    let cli = Cli::try_parse_from(["sw", "plan"]).unwrap();
    assert!(matches!(cli.command, Commands::Plan(PlanArgs { to: None })));
}
