//! Integration tests for the rolekeeper CLI
//!
//! Each test writes a directory snapshot into a temp dir and drives the
//! commands through the same `run` entry point the binary uses.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use clap::Parser;
use rolekeeper_cli::error::CliError;
use rolekeeper_cli::{run, Cli, Commands};
use rolekeeper_core::{
    DirectorySnapshot, MemberEntry, RoleEntry, RoleId, SpaceId, SpaceSnapshot, UserId,
};
use rolekeeper_reconcile::ReconcilerConfig;
use tempfile::TempDir;

const SPACE: SpaceId = SpaceId::new(7);
const NEWCOMER: RoleId = RoleId::new(1);
const REGULAR: RoleId = RoleId::new(2);
const VETERAN: RoleId = RoleId::new(3);
const HELPER: RoleId = RoleId::new(4);
const STAFF: RoleId = RoleId::new(5);
const ADMIN: RoleId = RoleId::new(9);

const ALICE: UserId = UserId::new(100);
const BOT: UserId = UserId::new(200);

struct Workspace {
    _dir: TempDir,
    rules: PathBuf,
    directory: PathBuf,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let rules = dir.path().join("rules.json");
        let directory = dir.path().join("directory.json");

        let roles = [
            (NEWCOMER, "Newcomer", 1),
            (REGULAR, "Regular", 2),
            (VETERAN, "Veteran", 3),
            (HELPER, "Helper", 4),
            (STAFF, "Staff", 5),
            (ADMIN, "Admin", 90),
        ]
        .into_iter()
        .map(|(id, name, position)| {
            (
                id,
                RoleEntry {
                    name: name.to_string(),
                    position,
                },
            )
        })
        .collect();

        let members = BTreeMap::from([
            (
                ALICE,
                MemberEntry {
                    name: Some("alice".to_string()),
                    roles: [VETERAN, HELPER].into_iter().collect(),
                    service_account: false,
                },
            ),
            (
                BOT,
                MemberEntry {
                    name: Some("bot".to_string()),
                    roles: [VETERAN].into_iter().collect(),
                    service_account: true,
                },
            ),
        ]);

        let snapshot = DirectorySnapshot {
            spaces: BTreeMap::from([(
                SPACE,
                SpaceSnapshot {
                    acting_position: 50,
                    roles,
                    members,
                },
            )]),
        };
        std::fs::write(&directory, serde_json::to_vec_pretty(&snapshot).unwrap()).unwrap();

        Self {
            _dir: dir,
            rules,
            directory,
        }
    }

    fn parse(&self, args: &[&str]) -> Cli {
        let mut argv = vec![
            "rolekeeper".to_string(),
            "--space".to_string(),
            SPACE.to_string(),
            "--rules".to_string(),
            path_arg(&self.rules),
            "--directory".to_string(),
            path_arg(&self.directory),
        ];
        argv.extend(args.iter().map(|a| (*a).to_string()));
        Cli::try_parse_from(argv).unwrap()
    }

    async fn run(&self, args: &[&str]) -> Result<(), CliError> {
        run(self.parse(args), ReconcilerConfig::default()).await
    }

    fn snapshot(&self) -> DirectorySnapshot {
        serde_json::from_slice(&std::fs::read(&self.directory).unwrap()).unwrap()
    }

    fn roles_of(&self, user: UserId) -> Vec<RoleId> {
        self.snapshot().spaces[&SPACE].members[&user]
            .roles
            .iter()
            .collect()
    }

    async fn define_rules(&self) {
        self.run(&["chain", "add", "progression", "1", "2", "3"])
            .await
            .unwrap();
        self.run(&["group", "add", "staff", "5", "4"]).await.unwrap();
    }
}

fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

// =========================================================================
// Argument parsing
// =========================================================================

#[test]
fn test_group_add_parsing() {
    let cli = Cli::try_parse_from([
        "rolekeeper",
        "--space",
        "7",
        "group",
        "add",
        "staff",
        "5",
        "4",
        "6",
    ])
    .unwrap();

    assert_eq!(cli.global.space, Some(SPACE));
    match cli.command {
        Commands::Group(args) => match args.command {
            rolekeeper_cli::commands::group::GroupCommands::Add(add) => {
                assert_eq!(add.name, "staff");
                assert_eq!(add.group_role, STAFF);
                assert_eq!(add.member_roles, vec![HELPER, RoleId::new(6)]);
            }
            other => panic!("unexpected group command: {other:?}"),
        },
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn test_group_add_requires_members() {
    let result = Cli::try_parse_from(["rolekeeper", "group", "add", "staff", "5"]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["rolekeeper", "audit", "--dry-run", "--json", "--space", "7"])
        .unwrap();
    assert!(cli.global.json);
    assert_eq!(cli.global.space, Some(SPACE));
    assert!(matches!(cli.command, Commands::Audit(ref a) if a.dry_run && !a.write_back));
}

#[test]
fn test_invalid_role_id_rejected() {
    let result = Cli::try_parse_from(["rolekeeper", "chain", "add", "ladder", "1", "two"]);
    assert!(result.is_err());
}

// =========================================================================
// Rule administration
// =========================================================================

#[tokio::test]
async fn test_rules_persist_to_file() {
    let ws = Workspace::new();
    ws.define_rules().await;

    let raw = std::fs::read_to_string(&ws.rules).unwrap();
    assert!(raw.contains("progression"));
    assert!(raw.contains("staff"));

    ws.run(&["group", "list"]).await.unwrap();
    ws.run(&["chain", "list", "--json"]).await.unwrap();
}

#[tokio::test]
async fn test_unmanageable_role_rejected() {
    let ws = Workspace::new();

    let err = ws
        .run(&["group", "add", "admins", "9", "4"])
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
    assert_eq!(err.exit_code(), 4);
    assert!(!ws.rules.exists());
}

#[tokio::test]
async fn test_remove_missing_group_is_not_found() {
    let ws = Workspace::new();

    let err = ws.run(&["group", "remove", "ghosts"]).await.unwrap_err();
    assert!(matches!(err, CliError::NotFound(_)));
    assert!(err.to_string().contains("ghosts"));
}

#[tokio::test]
async fn test_add_role_to_group() {
    let ws = Workspace::new();
    ws.define_rules().await;

    ws.run(&["group", "add-role", "staff", "3"]).await.unwrap();
    let err = ws
        .run(&["group", "add-role", "staff", "3"])
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Validation(_)));
}

// =========================================================================
// Reconciliation
// =========================================================================

#[tokio::test]
async fn test_audit_without_write_back_leaves_snapshot() {
    let ws = Workspace::new();
    ws.define_rules().await;

    ws.run(&["audit"]).await.unwrap();
    assert_eq!(ws.roles_of(ALICE), vec![VETERAN, HELPER]);
}

#[tokio::test]
async fn test_audit_write_back_grants_missing_roles() {
    let ws = Workspace::new();
    ws.define_rules().await;

    ws.run(&["audit", "--write-back"]).await.unwrap();
    assert_eq!(
        ws.roles_of(ALICE),
        vec![NEWCOMER, REGULAR, VETERAN, HELPER, STAFF]
    );
    // Service accounts are left alone.
    assert_eq!(ws.roles_of(BOT), vec![VETERAN]);
}

#[tokio::test]
async fn test_dry_run_audit_never_writes() {
    let ws = Workspace::new();
    ws.define_rules().await;

    ws.run(&["audit", "--dry-run", "--write-back"]).await.unwrap();
    assert_eq!(ws.roles_of(ALICE), vec![VETERAN, HELPER]);
}

#[tokio::test]
async fn test_reconcile_single_user() {
    let ws = Workspace::new();
    ws.define_rules().await;

    ws.run(&["check", &ALICE.to_string()]).await.unwrap();
    ws.run(&["reconcile", &ALICE.to_string(), "--write-back"])
        .await
        .unwrap();
    assert_eq!(
        ws.roles_of(ALICE),
        vec![NEWCOMER, REGULAR, VETERAN, HELPER, STAFF]
    );
}

#[tokio::test]
async fn test_unknown_user_is_directory_error() {
    let ws = Workspace::new();
    ws.define_rules().await;

    let err = ws.run(&["reconcile", "4242"]).await.unwrap_err();
    assert!(matches!(err, CliError::Directory(_)));
    assert_eq!(err.exit_code(), 3);
}

#[tokio::test]
async fn test_missing_space_is_config_error() {
    let ws = Workspace::new();
    let cli = Cli::try_parse_from([
        "rolekeeper",
        "--space",
        "8",
        "--rules",
        &path_arg(&ws.rules),
        "--directory",
        &path_arg(&ws.directory),
        "group",
        "list",
    ])
    .unwrap();

    let err = run(cli, ReconcilerConfig::default()).await.unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}
