//! audit: command-line front end for CIF dossier compliance audits.

mod commands;
mod config;
mod workspace;

use std::path::{Path, PathBuf};
use std::process;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};

use audit_core::Dossier;
use config::AuditConfig;
use workspace::Workspace;

#[derive(Parser)]
#[command(name = "audit", version, about = "Compliance audits of client dossiers")]
struct Cli {
    /// Log engine transitions (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an audit workspace in the current directory
    Init {
        /// Workspace name (default: directory name)
        name: Option<String>,
    },
    /// Inspect the question catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Show the documents a control requires for a dossier
    Controls {
        /// Control type (e.g., lcb-ft, operation)
        control: String,
        #[command(flatten)]
        dossier: DossierArgs,
    },
    /// Start auditing a dossier
    Start {
        /// Control type
        control: String,
        #[command(flatten)]
        dossier: DossierArgs,
    },
    /// Resume a suspended session
    Resume {
        control: String,
        #[command(flatten)]
        dossier: DossierArgs,
    },
    /// Drop a suspended session
    Discard {
        control: String,
        #[command(flatten)]
        dossier: DossierArgs,
    },
    /// Answer the current question
    Answer {
        /// Answer value (Oui/Non/N/A, option label or number, comma-separated checklist items, text, YYYY-MM-DD)
        value: Option<String>,
        /// Document to answer in (default: the active one)
        #[arg(long = "doc")]
        document: Option<String>,
        /// Quality verdict for an affirmative answer (conforme, non-conforme)
        #[arg(long)]
        quality: Option<String>,
        /// Failed quality criterion (repeatable)
        #[arg(long)]
        failed: Vec<String>,
        /// Justification for an anomaly
        #[arg(long)]
        justification: Option<String>,
        /// Obligation class of the anomaly (mandatory, optional)
        #[arg(long)]
        obligation: Option<String>,
        /// Keep the revised session's answer
        #[arg(long, conflicts_with = "value")]
        keep: bool,
    },
    /// Justify the pending anomaly
    Justify {
        text: String,
        #[arg(long = "doc")]
        document: Option<String>,
        /// Obligation class (mandatory, optional)
        #[arg(long, default_value = "mandatory")]
        obligation: String,
    },
    /// Go back to the previous question
    Back {
        #[arg(long = "doc")]
        document: Option<String>,
    },
    /// Show the session in progress
    Status,
    /// Checkpoint the session in progress
    Suspend {
        #[arg(long)]
        reason: Option<String>,
    },
    /// Close the session in progress and record it
    Complete,
    /// Start a revision of a completed session
    Revise {
        session_id: String,
    },
    /// List completed sessions
    History {
        /// Show one session in full
        #[arg(long)]
        session: Option<String>,
        /// Only sessions on this dossier reference
        #[arg(long)]
        dossier: Option<String>,
        /// Dossier attribute, as key=value (repeatable)
        #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attr)]
        attrs: Vec<(String, String)>,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List document types and controls
    List,
    /// Show the questions of a document type
    Show { document: String },
    /// Check a catalog file (default: the workspace catalog)
    Validate { path: Option<PathBuf> },
    /// Write the catalog as TOML
    Export {
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct DossierArgs {
    /// Dossier reference
    dossier: String,
    /// Dossier attribute, as key=value (repeatable)
    #[arg(long = "attr", value_name = "KEY=VALUE", value_parser = parse_attr)]
    attrs: Vec<(String, String)>,
}

impl DossierArgs {
    fn into_dossier(self) -> Dossier {
        to_dossier(self.dossier, self.attrs)
    }
}

fn to_dossier(reference: String, attrs: Vec<(String, String)>) -> Dossier {
    attrs
        .into_iter()
        .fold(Dossier::new(reference), |d, (k, v)| d.with(k, v))
}

fn parse_attr(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((k, v)) if !k.trim().is_empty() => Ok((k.trim().to_string(), v.trim().to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = AuditConfig::find_and_load(&cwd)?;
    init_logging(cli.verbose, config.as_ref().and_then(|(c, _)| c.log_level()));
    dispatch(cli.command, &cwd, config)
}

/// `RUST_LOG` wins over `--verbose`, which wins over `[logging] level`.
fn init_logging(verbose: bool, configured: Option<&str>) {
    let default = if verbose {
        "debug"
    } else {
        configured.unwrap_or("warn")
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn dispatch(
    command: Commands,
    cwd: &Path,
    config: Option<(AuditConfig, PathBuf)>,
) -> anyhow::Result<()> {
    let workspace = config.map(|(config, root)| Workspace::new(config, root));

    match command {
        Commands::Init { name } => {
            let name = match name {
                Some(name) => name,
                None => cwd
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("audit")
                    .to_string(),
            };
            commands::init::run(cwd, &name)
        }

        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(&catalog_for(workspace.as_ref())?),
            CatalogAction::Show { document } => {
                commands::catalog::show(&catalog_for(workspace.as_ref())?, &document)
            }
            CatalogAction::Validate { path } => {
                let catalog = match (&path, &workspace) {
                    (None, Some(ws)) => Some(ws.catalog()?),
                    _ => None,
                };
                if !commands::catalog::validate(catalog.as_ref(), path.as_deref())? {
                    bail!("catalog has errors");
                }
                Ok(())
            }
            CatalogAction::Export { output } => {
                commands::catalog::export(&catalog_for(workspace.as_ref())?, output.as_deref())
            }
        },

        Commands::Controls { control, dossier } => commands::catalog::controls(
            &catalog_for(workspace.as_ref())?,
            &control,
            &dossier.into_dossier(),
        ),

        Commands::Start { control, dossier } => {
            commands::session::start(&require(workspace)?, dossier.into_dossier(), &control)
        }
        Commands::Resume { control, dossier } => {
            commands::session::resume(&require(workspace)?, &dossier.into_dossier(), &control)
        }
        Commands::Discard { control, dossier } => {
            commands::session::discard(&require(workspace)?, &dossier.into_dossier(), &control)
        }

        Commands::Answer {
            value,
            document,
            quality,
            failed,
            justification,
            obligation,
            keep,
        } => commands::session::answer(
            &require(workspace)?,
            document.as_deref(),
            commands::session::AnswerInput {
                value,
                quality,
                failed,
                justification,
                obligation,
                keep,
            },
        ),
        Commands::Justify {
            text,
            document,
            obligation,
        } => commands::session::justify(&require(workspace)?, document.as_deref(), &text, &obligation),
        Commands::Back { document } => {
            commands::session::back(&require(workspace)?, document.as_deref())
        }
        Commands::Status => commands::session::status(&require(workspace)?),
        Commands::Suspend { reason } => commands::session::suspend(&require(workspace)?, reason),
        Commands::Complete => commands::session::complete(&require(workspace)?),
        Commands::Revise { session_id } => {
            commands::session::revise(&require(workspace)?, &session_id)
        }

        Commands::History {
            session,
            dossier,
            attrs,
        } => {
            let ws = require(workspace)?;
            let history = ws.history();
            match (session, dossier) {
                (Some(id), _) => commands::history::show(&history, &id),
                (None, Some(reference)) => {
                    commands::history::list(&history, Some(&to_dossier(reference, attrs)))
                }
                (None, None) => commands::history::list(&history, None),
            }
        }
    }
}

fn require(workspace: Option<Workspace>) -> anyhow::Result<Workspace> {
    match workspace {
        Some(ws) => Ok(ws),
        None => bail!("no audit.toml found (run `audit init` first)"),
    }
}

/// The workspace catalog, or the built-in one outside a workspace.
fn catalog_for(workspace: Option<&Workspace>) -> anyhow::Result<audit_catalog::Catalog> {
    match workspace {
        Some(ws) => ws.catalog(),
        None => Ok(audit_catalog::Catalog::builtin()),
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use audit_engine::{HistoryStore, SuspensionStore, Verdict};

    const CATALOG: &str = r#"
[[documents]]
id = "kyc"
title = "Recueil client"

[[documents.questions]]
prompt = "Le recueil est-il présent ?"
kind = { type = "boolean" }
skip_on = ["Non"]

[[documents.questions]]
prompt = "Rubriques incomplètes"
kind = { type = "checklist", options = ["Revenus", "Patrimoine"] }

[[controls]]
id = "lcb-ft"
label = "LCB-FT"
documents = ["kyc"]
"#;

    fn workspace() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        commands::init::create_workspace(dir.path(), "test").unwrap();
        std::fs::write(dir.path().join("cif.catalog.toml"), CATALOG).unwrap();
        let config_path = dir.path().join("audit.toml");
        let mut config = std::fs::read_to_string(&config_path).unwrap();
        config.push_str("\n[catalog]\npath = \"cif.catalog.toml\"\n");
        std::fs::write(&config_path, config).unwrap();
        dir
    }

    fn audit(dir: &Path, args: &[&str]) -> anyhow::Result<()> {
        let cli = Cli::try_parse_from(std::iter::once("audit").chain(args.iter().copied()))?;
        let config = AuditConfig::find_and_load(dir)?;
        dispatch(cli.command, dir, config)
    }

    fn loaded(dir: &Path) -> Workspace {
        let (config, root) = AuditConfig::find_and_load(dir).unwrap().unwrap();
        Workspace::new(config, root)
    }

    /// Full workflow: start, suspend, resume, complete, revise.
    #[test]
    fn start_suspend_resume_complete_revise() {
        let dir = workspace();
        let p = dir.path();

        audit(p, &["start", "lcb-ft", "D-1", "--attr", "client=Durand"]).unwrap();
        assert!(p.join(".audit/current.das").is_file());
        audit(p, &["answer", "oui"]).unwrap();

        audit(p, &["suspend", "--reason", "pièce manquante"]).unwrap();
        assert!(!p.join(".audit/current.das").exists());
        assert!(audit(p, &["status"]).is_ok());

        let err = audit(p, &["start", "lcb-ft", "D-1", "--attr", "client=Durand"]).unwrap_err();
        assert!(err.to_string().contains("suspended session"));

        audit(p, &["resume", "lcb-ft", "D-1", "--attr", "client=Durand"]).unwrap();
        let session = loaded(p).load_current().unwrap().unwrap();
        assert_eq!(session.document("kyc").unwrap().answered_count(), 1);

        audit(p, &["answer", "-"]).unwrap();
        audit(p, &["status"]).unwrap();
        audit(p, &["complete"]).unwrap();
        assert!(!p.join(".audit/current.das").exists());

        let ws = loaded(p);
        let records = ws.history().list().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].verdict(), Verdict::Conforming);
        let engine = ws.engine().unwrap();
        assert!(engine.suspensions().keys().unwrap().is_empty());

        let parent = records[0].session_id.to_string();
        audit(p, &["history"]).unwrap();
        audit(p, &["history", "--session", &parent]).unwrap();

        audit(p, &["revise", &parent]).unwrap();
        audit(p, &["answer", "--keep"]).unwrap();
        audit(p, &["answer", "--keep"]).unwrap();
        audit(p, &["complete"]).unwrap();

        let records = loaded(p).history().list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].revision_of, Some(records[0].session_id));
        assert!(records[1].modified_fields.is_empty());
    }

    #[test]
    fn anomaly_needs_a_justification() {
        let dir = workspace();
        let p = dir.path();

        audit(p, &["start", "lcb-ft", "D-2"]).unwrap();
        audit(p, &["answer", "non"]).unwrap();
        assert!(audit(p, &["complete"]).is_err());

        audit(p, &["justify", "Recueil non transmis par le client"]).unwrap();
        audit(p, &["complete"]).unwrap();

        let records = loaded(p).history().list().unwrap();
        assert_eq!(records[0].anomaly_count, 1);
        assert_eq!(records[0].verdict(), Verdict::NonConforming);
    }

    #[test]
    fn back_reopens_the_previous_question() {
        let dir = workspace();
        let p = dir.path();

        audit(p, &["start", "lcb-ft", "D-3"]).unwrap();
        audit(p, &["answer", "oui"]).unwrap();
        audit(p, &["back"]).unwrap();

        let session = loaded(p).load_current().unwrap().unwrap();
        let kyc = session.document("kyc").unwrap();
        assert_eq!(kyc.current_index(), Some(0));
        assert_eq!(kyc.answered_count(), 0);
    }

    #[test]
    fn one_session_at_a_time() {
        let dir = workspace();
        let p = dir.path();

        audit(p, &["start", "lcb-ft", "D-4"]).unwrap();
        let err = audit(p, &["start", "lcb-ft", "D-5"]).unwrap_err();
        assert!(err.to_string().contains("still open"));

        audit(p, &["discard", "lcb-ft", "D-4"]).unwrap();
        audit(p, &["start", "lcb-ft", "D-5"]).unwrap();
    }

    #[test]
    fn catalog_commands_work_outside_a_workspace() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("no-workspace");
        std::fs::create_dir_all(&nested).unwrap();
        let err = audit(&nested, &["status"]).unwrap_err();
        assert!(err.to_string().contains("audit init"));
        audit(&nested, &["catalog", "list"]).unwrap();
        audit(&nested, &["controls", "lcb-ft", "D-1"]).unwrap();
    }

    #[test]
    fn bad_attributes_are_rejected() {
        assert!(parse_attr("client=Durand").is_ok());
        assert!(parse_attr("client").is_err());
        assert!(parse_attr("=Durand").is_err());
    }
}
