use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use warden_core::{OutputFormat, WardenConfig};
use warden_governance::{Fact, FactSet};
use warden_review::gitcode::parse_pr_reference;
use warden_review::pipeline::{Evaluation, Outcome};
use warden_review::{evaluate, ChecklistTemplate, GitCodeClient, GitWorkspace, ReviewPipeline};

#[derive(Parser)]
#[command(
    name = "warden",
    version,
    about = "Review checklist bot for governance repositories",
    long_about = "Warden reads what a pull request changes in a governance repository,\n\
                   derives the facts reviewers care about (maintainer changes, new or\n\
                   recycled repositories, committer changes) and keeps one review\n\
                   checklist comment up to date on the pull request.\n\n\
                   Examples:\n  \
                     warden review --pr openeuler/community#42 --repo-dir .\n  \
                     warden review --pr openeuler/community#42 --repo-dir . --post\n  \
                     warden facts --repo-dir . --target master\n  \
                     warden check-template config/reviewer_checklist_en.yaml"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .warden.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text  Human-readable output (default)\n  \
                         json  Machine-readable JSON with camelCase keys"
    )]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a pull request and render its review checklist
    #[command(long_about = "Evaluate a pull request and render its review checklist.\n\n\
        The working copy at --repo-dir must have the pull request head checked out\n\
        and the target branch available. Without --post nothing is written to the\n\
        API; the rendered comment is printed instead.\n\n\
        Examples:\n  warden review --pr openeuler/community#42 --repo-dir .\n  \
        warden review --pr src-openeuler/kernel#7 --repo-dir ../kernel --post")]
    Review {
        /// Pull request reference (owner/repo#number)
        #[arg(long)]
        pr: String,

        /// Working copy with the pull request head checked out
        #[arg(long, default_value = ".")]
        repo_dir: PathBuf,

        /// Target branch (default: the one reported by the API)
        #[arg(long)]
        target: Option<String>,

        /// Post the comment, delete superseded checklists and apply labels
        #[arg(long)]
        post: bool,
    },
    /// Print the governance facts of a working copy as JSON
    #[command(long_about = "Print the governance facts of a working copy as JSON.\n\n\
        Runs the diff and rule stages only; no API access is needed.\n\n\
        Examples:\n  warden facts --repo-dir . --target master --author alice")]
    Facts {
        /// Working copy with the pull request head checked out
        #[arg(long, default_value = ".")]
        repo_dir: PathBuf,

        /// Target branch to diff against
        #[arg(long)]
        target: String,

        /// Pull request author, excluded from notification lists
        #[arg(long, default_value = "")]
        author: String,
    },
    /// Parse a checklist template and list its items
    CheckTemplate {
        /// Template file (YAML)
        file: PathBuf,
    },
    /// Create a default .warden.toml configuration file
    Init,
}

const DEFAULT_CONFIG: &str = r#"# Warden Configuration

[git]
# Default integration branch
default_branch = "master"

[review]
# Checklist templates, chosen by the language of the pull request
template_zh = "config/reviewer_checklist_zh.yaml"
template_en = "config/reviewer_checklist_en.yaml"
# Label added when the checklist asks every member to sign off
wait_confirm_label = "wait_confirm"
consensus_markers = ["等所有人", "approved by all members"]

# Languages named by the static-check item (replaces the built-in table)
# [[review.languages]]
# name = "Python"
# checker = "pylint-3"
# patterns = ["*.py"]

# Display tokens for review statuses
# [review.status]
# go = "go"
# nogo = "nogo"
# na = "n/a"
# question = "question"
# ongoing = "ongoing"

[api]
base_url = "https://api.gitcode.com/api/v5"
per_page = 10
# token = "..."  # or export GITCODE_TOKEN
"#;

fn init_tracing(verbose: bool) {
    let default = if verbose { "warden=debug" } else { "warden=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>) -> Result<WardenConfig> {
    let config = match path {
        Some(path) => WardenConfig::from_file(path)?,
        None => {
            let default_path = Path::new(".warden.toml");
            if default_path.exists() {
                WardenConfig::from_file(default_path)?
            } else {
                tracing::debug!("no .warden.toml found, using defaults");
                WardenConfig::default()
            }
        }
    };
    Ok(config)
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).into_diagnostic()?;
    println!("{json}");
    Ok(())
}

fn evaluation_json(evaluation: &Evaluation) -> serde_json::Value {
    let evidence = evaluation.evidence.as_ref().map(|e| {
        serde_json::json!({
            "changes": e.changes.iter().map(ToString::to_string).collect::<Vec<_>>(),
            "languages": e.languages,
            "licenseChanged": e.license_changed,
            "versionChanged": e.version_changed,
        })
    });
    serde_json::json!({
        "evidence": evidence,
        "facts": evaluation.facts,
        "derived": evaluation.facts.as_ref().map(FactSet::facts),
    })
}

fn describe(fact: &Fact) -> String {
    match fact {
        Fact::MaintainerSetChanged {
            sig,
            added_or_removed,
            current_owners,
        } => format!(
            "maintainers of {sig} changed (membership: {added_or_removed}, owners: {})",
            current_owners.join(", ")
        ),
        Fact::SigRecordTouched { sig, owners } => {
            format!("{sig} record updated (owners: {})", owners.join(", "))
        }
        Fact::RepositoryIntroduced => "repository introduced".into(),
        Fact::RepositoryRecycled => "repository recycled".into(),
        Fact::CommitterAssignmentChanged { identity } => {
            format!("committer assignments of {identity} changed")
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Review {
            pr,
            repo_dir,
            target,
            post,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let (owner, repo, number) = parse_pr_reference(&pr)?;
            let token = config.api_token()?;
            let client = GitCodeClient::new(&config.api, token, owner.as_str(), repo.as_str())?;
            let pipeline = ReviewPipeline::new(client, config, owner, repo).posting(post);

            let report = pipeline
                .run(number, &GitWorkspace::new(repo_dir), target.as_deref())
                .await?;

            match cli.format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => {
                    println!("{}", report.comment);
                    for warning in &report.warnings {
                        eprintln!("dropped item {}: {}", warning.item, warning.message);
                    }
                    if report.outcome == Outcome::Conflict {
                        eprintln!("pull request has conflicts, no checklist rendered");
                    } else if post {
                        eprintln!(
                            "posted {} rows, deleted {} superseded checklists",
                            report.rows,
                            report.deleted.len()
                        );
                    } else {
                        eprintln!("dry run: {} rows, nothing posted (use --post)", report.rows);
                    }
                    if let Some(label) = &report.label {
                        eprintln!("label: {label}");
                    }
                }
            }
        }
        Command::Facts {
            repo_dir,
            target,
            author,
        } => {
            let config = load_config(cli.config.as_deref())?;
            let evaluation = evaluate(&GitWorkspace::new(repo_dir), &config, &target, &author)?;
            if cli.verbose {
                match &evaluation.facts {
                    Some(facts) => {
                        for fact in facts.facts() {
                            eprintln!("{}", describe(&fact));
                        }
                    }
                    None => eprintln!("changed files could not be determined"),
                }
            }
            print_json(&evaluation_json(&evaluation))?;
        }
        Command::CheckTemplate { file } => {
            let template = ChecklistTemplate::from_file(&file)?;
            match cli.format {
                OutputFormat::Json => {
                    let items: Vec<_> = template
                        .items()
                        .iter()
                        .map(|item| {
                            serde_json::json!({
                                "group": item.group.to_string(),
                                "category": item.category,
                                "condition": item.condition.to_string(),
                                "name": item.name,
                                "claim": item.claim,
                            })
                        })
                        .collect();
                    print_json(&items)?;
                }
                OutputFormat::Text => {
                    for (index, item) in template.items().iter().enumerate() {
                        println!(
                            "{index:>3}  {:<24} {:<16} {:<22} {}",
                            item.group.to_string(),
                            item.category,
                            item.condition.to_string(),
                            item.name.as_deref().unwrap_or("-"),
                        );
                    }
                    let undetected = template
                        .items()
                        .iter()
                        .filter(|item| item.condition.is_undetected())
                        .count();
                    println!(
                        "{} items ({undetected} with conditions that are not detected yet)",
                        template.items().len()
                    );
                }
            }
        }
        Command::Init => {
            let path = Path::new(".warden.toml");
            if path.exists() {
                miette::bail!(".warden.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .warden.toml with default configuration");
        }
    }

    Ok(())
}
