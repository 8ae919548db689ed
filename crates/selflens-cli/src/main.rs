use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use selflens_core::export::{self, BACKUP_FILE_NAME, CSV_FILE_NAME};
use selflens_core::{
    Emotion, Incident, IncidentContext, IncidentDraft, IncidentFilter, IncidentId, IncidentType,
    Insights, Screen, Severity,
};
use selflens_journal::Journal;
use selflens_store::{load_config, FileStore};
use tracing_subscriber::EnvFilter;

const DISCLAIMER: &str = "\
SelfLens is your private space for reflection and tracking personal experiences.
Everything you log stays on this device.

This is a personal journaling tool, not therapy or professional advice. If you
need support, consider reaching out to a counselor, therapist, or a trusted
person in your life.

By using SelfLens you understand that all data is stored locally, that you are
responsible for the content you create, that this is not legal documentation,
and that insights are patterns in your own entries, not recommendations.";

// ── CLI Definition ──

#[derive(Parser)]
#[command(name = "selflens", about = "Private journal for noticing patterns in your experiences")]
struct Cli {
    /// Directory holding the journal records
    #[arg(long, global = true, env = "SELFLENS_DATA_DIR", default_value = "selflens-data")]
    data_dir: PathBuf,

    /// Access code for a locked journal
    #[arg(long, global = true, env = "SELFLENS_CODE", hide_env_values = true)]
    code: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read and accept the disclaimer
    Agree,
    /// Log a new incident
    Add {
        #[arg(long = "type", default_value = "gaslighting")]
        kind: IncidentType,
        #[arg(long, default_value = "other")]
        context: IncidentContext,
        /// 1 (mild) to 10 (severe)
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(i64).range(1..=10))]
        severity: i64,
        /// Repeat to record several emotions
        #[arg(long = "emotion")]
        emotions: Vec<Emotion>,
        #[arg(long)]
        person: Option<String>,
        /// Day it happened (YYYY-MM-DD), today if omitted
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an incident by id
    Delete { id: i64 },
    /// Show the timeline, optionally filtered
    List {
        #[arg(long = "type", default_value = "all")]
        kind: String,
        #[arg(long, default_value = "all")]
        context: String,
    },
    /// Summarize patterns across all incidents
    Insights,
    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Show or switch the color theme
    Theme {
        #[command(subcommand)]
        action: ThemeAction,
    },
    /// Manage the access code
    Lock {
        #[command(subcommand)]
        action: LockAction,
    },
    /// Export the journal
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        /// File or directory to write to; stdout if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replace profile and incidents from a JSON backup
    Import { file: PathBuf },
    /// Serve the web front end and the journal document over HTTP
    Serve {
        #[arg(long)]
        port: Option<u16>,
        #[arg(long)]
        public_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    Show,
    Set {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        avatar: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
}

#[derive(Subcommand)]
enum ThemeAction {
    Show,
    Toggle,
}

#[derive(Subcommand)]
enum LockAction {
    /// Set an access code (at least 4 characters)
    Set { code: String },
    Remove,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

// ── Helpers ──

fn init_logging(command: &Commands) {
    let default = match command {
        Commands::Serve { .. } => "selflens=info,tower_http=info",
        _ => "warn",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(io::stderr)
        .init();
}

fn open_journal(data_dir: &Path) -> Result<Journal<FileStore>> {
    let store = FileStore::open(data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;
    Journal::open(store)
}

/// Pass the disclaimer and lock gates, or explain what is missing.
fn require_open(journal: &mut Journal<FileStore>, code: Option<&str>) -> Result<()> {
    match journal.view().screen() {
        Screen::Disclaimer => bail!("accept the disclaimer first with `selflens agree`"),
        Screen::Locked => {
            let code = code.context("journal is locked, pass --code")?;
            journal.unlock(code)?;
            Ok(())
        }
        _ => Ok(()),
    }
}

fn render_incident(incident: &Incident) -> String {
    let mut line = format!(
        "{}  {}  {:<18} {:<9} severity {:>2}",
        incident.id,
        incident.occurred_on,
        incident.kind,
        incident.context,
        incident.severity
    );
    if let Some(person) = incident.person_label() {
        line.push_str(&format!("  with {}", person));
    }
    if !incident.emotions.is_empty() {
        line.push_str(&format!("  [{}]", incident.emotions.join(", ")));
    }
    if let Some(notes) = &incident.notes {
        line.push_str(&format!("\n    {}", notes));
    }
    line
}

fn render_insights(insights: &Insights) -> String {
    let (top_type, type_count) = insights.most_common_type;
    let (top_context, context_count) = insights.most_common_context;

    let mut lines = vec![
        format!("Average severity: {}", insights.average_severity),
        format!("Positive experiences: {}", insights.positive_count),
        format!("Most common type: {} ({})", top_type, type_count),
        format!("Most common context: {} ({})", top_context, context_count),
    ];
    if let Some((person, count)) = &insights.most_common_person {
        lines.push(format!("Most mentioned person: {} ({})", person, count));
    }
    lines.push("By type:".to_string());
    for (kind, count) in &insights.type_counts {
        lines.push(format!("  {:<18} {}", kind, count));
    }
    lines.join("\n")
}

/// Write to `out`, or stdout when absent. A directory gets the default name.
fn write_export(out: Option<PathBuf>, default_name: &str, content: &str, stdout: &mut impl Write) -> Result<()> {
    match out {
        None => {
            writeln!(stdout, "{}", content)?;
        }
        Some(path) => {
            let path = if path.is_dir() {
                path.join(default_name)
            } else {
                path
            };
            fs::write(&path, content).with_context(|| format!("writing {}", path.display()))?;
            writeln!(stdout, "exported to {}", path.display())?;
        }
    }
    Ok(())
}

// ── Commands ──

fn run(cli: Cli, stdout: &mut impl Write) -> Result<()> {
    let mut journal = open_journal(&cli.data_dir)?;

    match cli.command {
        Commands::Agree => {
            writeln!(stdout, "{}\n", DISCLAIMER)?;
            journal.agree()?;
            writeln!(stdout, "Welcome to SelfLens.")?;
        }
        Commands::Serve { port, public_dir } => {
            let mut config = load_config(&cli.data_dir)?.server;
            if let Some(env_port) = std::env::var("PORT").ok().and_then(|p| p.parse().ok()) {
                config.port = env_port;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(public_dir) = public_dir {
                config.public_dir = public_dir;
            }
            let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
            runtime.block_on(selflens_server::serve(journal, &config))?;
        }
        command => {
            require_open(&mut journal, cli.code.as_deref())?;
            run_journal_command(command, &mut journal, stdout)?;
        }
    }

    Ok(())
}

fn run_journal_command(
    command: Commands,
    journal: &mut Journal<FileStore>,
    stdout: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::Add {
            kind,
            context,
            severity,
            emotions,
            person,
            date,
            notes,
        } => {
            let mut draft = match date {
                Some(date) => IncidentDraft::new(date),
                None => IncidentDraft::default(),
            };
            draft.kind = kind;
            draft.context = context;
            draft.severity = Severity::new(severity)?;
            draft.emotions = emotions.into_iter().collect();
            draft.person = person;
            draft.notes = notes;
            let incident = journal.add_incident(draft)?;
            writeln!(stdout, "logged incident {}", incident.id)?;
        }
        Commands::Delete { id } => {
            if journal.delete_incident(IncidentId(id))? {
                writeln!(stdout, "deleted incident {}", id)?;
            } else {
                writeln!(stdout, "no incident with id {}", id)?;
            }
        }
        Commands::List { kind, context } => {
            let filter = IncidentFilter::from_selectors(&kind, &context);
            let selected = journal.filtered(&filter);
            if selected.is_empty() {
                writeln!(stdout, "No incidents match.")?;
            }
            for incident in selected {
                writeln!(stdout, "{}", render_incident(incident))?;
            }
        }
        Commands::Insights => match journal.insights() {
            Some(insights) => writeln!(stdout, "{}", render_insights(&insights))?,
            None => writeln!(stdout, "No incidents logged yet. Add one with `selflens add`.")?,
        },
        Commands::Profile { action } => match action {
            ProfileAction::Show => {
                let profile = journal.profile();
                writeln!(stdout, "username: {}", profile.username)?;
                writeln!(stdout, "name:     {}", profile.name)?;
                writeln!(stdout, "avatar:   {}", profile.avatar)?;
                writeln!(stdout, "notes:    {}", profile.notes)?;
            }
            ProfileAction::Set {
                username,
                avatar,
                name,
                notes,
            } => {
                let mut profile = journal.profile().clone();
                if let Some(username) = username {
                    profile.username = username;
                }
                if let Some(avatar) = avatar {
                    profile.avatar = avatar;
                }
                if let Some(name) = name {
                    profile.name = name;
                }
                if let Some(notes) = notes {
                    profile.notes = notes;
                }
                journal.update_profile(profile)?;
                writeln!(stdout, "profile saved")?;
            }
        },
        Commands::Theme { action } => match action {
            ThemeAction::Show => writeln!(stdout, "{}", journal.theme())?,
            ThemeAction::Toggle => writeln!(stdout, "theme is now {}", journal.toggle_theme()?)?,
        },
        Commands::Lock { action } => match action {
            LockAction::Set { code } => {
                journal.set_access_code(&code)?;
                writeln!(stdout, "access code set")?;
            }
            LockAction::Remove => {
                journal.remove_access_code()?;
                writeln!(stdout, "access code removed")?;
            }
        },
        Commands::Export { format, out } => match format {
            ExportFormat::Json => write_export(out, BACKUP_FILE_NAME, &journal.export_json()?, stdout)?,
            ExportFormat::Csv => write_export(out, CSV_FILE_NAME, &journal.export_csv(), stdout)?,
        },
        Commands::Import { file } => {
            let content = fs::read_to_string(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let document = export::from_json(&content)
                .with_context(|| format!("parsing {}", file.display()))?;
            let count = document.incidents.len();
            journal.replace_document(document)?;
            writeln!(stdout, "imported {} incidents", count)?;
        }
        Commands::Agree | Commands::Serve { .. } => unreachable!("handled before the gate"),
    }
    Ok(())
}

// ── Main ──

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.command);

    let mut stdout = io::stdout().lock();
    if let Err(e) = run(cli, &mut stdout) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

// ── Tests ──
