mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{Args, CommandFactory, Parser};
use diary_core::checker::ProcessChecker;
use diary_core::config::Settings;
use diary_core::ingestion::{load_diary, LoadOptions};
use diary_core::mappings::MappingRegistry;
use diary_core::reconciliation::check_records_exist;
use diary_core::store::DiaryStore;
use diary_core::types::DiaryOutcome;
use diary_core::{db, DiaryError};
use diary_parser::DiaryLayout;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Disposal diary ingestion and archive reconciliation",
    long_about = None,
    arg_required_else_help = true
)]
struct Cli {
    #[command(flatten)]
    action: Action,

    /// Record layout of the diary being loaded [default: v13]
    #[arg(long, value_name = "LAYOUT")]
    layout: Option<DiaryLayout>,

    /// Free-text notes stored with the loaded diary
    #[arg(long, value_name = "TEXT")]
    notes: Option<String>,

    /// Print results as JSON instead of tables
    #[arg(long)]
    json: bool,

    /// TOML settings file; environment variables override its values
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Skip running embedded database migrations
    #[arg(long = "skip_migrations")]
    skip_migrations: bool,
}

#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
struct Action {
    /// Parse a diary file and store it as the pending diary
    #[arg(long = "load_diary", value_name = "PATH")]
    load_diary: Option<PathBuf>,

    /// Check every record of the pending diary against the archive
    #[arg(long = "check_records_exist")]
    check_records_exist: bool,

    /// List all loaded diaries
    #[arg(long = "view_diary")]
    view_diary: bool,

    /// Delete a diary and all of its records
    #[arg(long = "delete_diary", value_name = "ID")]
    delete_diary: Option<i64>,

    /// Close the pending diary with an outcome of `ok` or `errors`
    #[arg(long = "close_diary", num_args = 2, value_names = ["ID", "OUTCOME"])]
    close_diary: Option<Vec<String>>,

    /// Map a diary column name to an archive field name
    #[arg(long = "add_field_mapping", num_args = 2, value_names = ["IDR_COL_NAME", "ACTUAL_COL_NAME"])]
    add_field_mapping: Option<Vec<String>>,

    #[arg(long = "view_field_mappings")]
    view_field_mappings: bool,

    #[arg(long = "delete_field_mapping", value_name = "IDR_COL_NAME")]
    delete_field_mapping: Option<String>,

    /// Map a diary table name to an archive folder
    #[arg(long = "add_ag_mapping", num_args = 2, value_names = ["TBL_NAME", "ACTUAL_FOLDER_NAME"])]
    add_ag_mapping: Option<Vec<String>>,

    #[arg(long = "view_ag_mappings")]
    view_ag_mappings: bool,

    #[arg(long = "delete_ag_mapping", value_name = "TBL_NAME")]
    delete_ag_mapping: Option<String>,

    /// Apply embedded database migrations and exit
    #[arg(long)]
    migrate: bool,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    LoadDiary(PathBuf),
    CheckRecordsExist,
    ViewDiary,
    DeleteDiary(i64),
    CloseDiary { id: i64, outcome: DiaryOutcome },
    AddFieldMapping { idr_col_name: String, actual_col_name: String },
    ViewFieldMappings,
    DeleteFieldMapping(String),
    AddFolderMapping { tbl_name: String, actual_folder_name: String },
    ViewFolderMappings,
    DeleteFolderMapping(String),
    Migrate,
}

impl Action {
    fn into_command(self) -> Result<Command, String> {
        if let Some(path) = self.load_diary {
            return Ok(Command::LoadDiary(path));
        }
        if self.check_records_exist {
            return Ok(Command::CheckRecordsExist);
        }
        if self.view_diary {
            return Ok(Command::ViewDiary);
        }
        if let Some(id) = self.delete_diary {
            return Ok(Command::DeleteDiary(id));
        }
        if let Some(values) = self.close_diary {
            let [id, outcome] = pair(values)?;
            let id = id
                .parse::<i64>()
                .map_err(|_| format!("invalid diary id '{id}'"))?;
            return Ok(Command::CloseDiary {
                id,
                outcome: outcome.parse()?,
            });
        }
        if let Some(values) = self.add_field_mapping {
            let [idr_col_name, actual_col_name] = pair(values)?;
            return Ok(Command::AddFieldMapping {
                idr_col_name,
                actual_col_name,
            });
        }
        if self.view_field_mappings {
            return Ok(Command::ViewFieldMappings);
        }
        if let Some(name) = self.delete_field_mapping {
            return Ok(Command::DeleteFieldMapping(name));
        }
        if let Some(values) = self.add_ag_mapping {
            let [tbl_name, actual_folder_name] = pair(values)?;
            return Ok(Command::AddFolderMapping {
                tbl_name,
                actual_folder_name,
            });
        }
        if self.view_ag_mappings {
            return Ok(Command::ViewFolderMappings);
        }
        if let Some(name) = self.delete_ag_mapping {
            return Ok(Command::DeleteFolderMapping(name));
        }
        if self.migrate {
            return Ok(Command::Migrate);
        }
        Err("no action given".to_string())
    }
}

fn pair(values: Vec<String>) -> Result<[String; 2], String> {
    <[String; 2]>::try_from(values).map_err(|v| format!("expected 2 values, got {}", v.len()))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let command = match cli.action_command() {
        Ok(command) => command,
        Err(message) => Cli::command()
            .error(ErrorKind::ValueValidation, message)
            .exit(),
    };

    match run(&cli, command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{err:#}"), "diary-admin failed");
            eprintln!("error: {err:#}");
            let code = err
                .downcast_ref::<DiaryError>()
                .map(DiaryError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

impl Cli {
    /// Resolves the action flag. `--layout` and `--notes` only apply to
    /// `--load_diary`.
    fn action_command(&self) -> Result<Command, String> {
        let command = self.action.clone().into_command()?;
        if !matches!(command, Command::LoadDiary(_)) {
            if self.layout.is_some() {
                return Err("--layout can only be used with --load_diary".to_string());
            }
            if self.notes.is_some() {
                return Err("--notes can only be used with --load_diary".to_string());
            }
        }
        Ok(command)
    }
}

async fn run(cli: &Cli, command: Command) -> Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load(cli.config.as_deref())?;
    let pool = db::connect(settings.database_url()?, settings.max_connections)
        .await
        .context("failed to connect to the diary database")?;

    if command == Command::Migrate {
        db::run_migrations(&pool).await?;
        println!("Migrations applied.");
        return Ok(());
    }

    if cli.skip_migrations {
        info!("Skipping migrations at user request");
    } else {
        db::run_migrations(&pool).await?;
    }

    let store = DiaryStore::new(pool.clone());
    let registry = MappingRegistry::new(pool);

    match command {
        Command::LoadDiary(path) => {
            let options = LoadOptions {
                layout: cli.layout.unwrap_or_default(),
                notes: cli.notes.clone(),
            };
            let receipt = load_diary(&store, &path, &options)
                .await
                .with_context(|| format!("failed to load diary {}", path.display()))?;
            if cli.json {
                output::print_json(&receipt)?;
            } else {
                println!("{}", output::receipt_line(&receipt));
            }
        }
        Command::CheckRecordsExist => {
            let checker = ProcessChecker::from_settings(&settings.checker);
            info!(program = checker.program(), "Checking pending diary records");
            let report = check_records_exist(&store, &registry, &checker).await?;
            if cli.json {
                output::print_json(&report)?;
            } else {
                println!("{}", output::report_table(&report));
                for skipped in &report.skipped_records {
                    println!(
                        "  record {} skipped: no {:?} mapping for {}.{}",
                        skipped.record_id, skipped.missing, skipped.tbl_name, skipped.idr_col_name
                    );
                }
            }
        }
        Command::ViewDiary => {
            let diaries = store.list_diaries().await?;
            if cli.json {
                output::print_json(&diaries)?;
            } else if diaries.is_empty() {
                println!("No diaries loaded.");
            } else {
                println!("{}", output::diaries_table(&diaries));
            }
        }
        Command::DeleteDiary(id) => {
            let removed = store.delete_diary(id).await?;
            println!("Deleted diary ID {id} and {removed} records.");
        }
        Command::CloseDiary { id, outcome } => {
            let diary = store.close_diary(id, outcome).await?;
            println!("Diary ID {} ({}) closed as {}.", diary.id, diary.name, diary.status);
        }
        Command::AddFieldMapping {
            idr_col_name,
            actual_col_name,
        } => {
            registry
                .add_field_mapping(&idr_col_name, &actual_col_name)
                .await?;
            println!("Field mapping {idr_col_name} -> {actual_col_name} added.");
        }
        Command::ViewFieldMappings => {
            let mappings = registry.list_field_mappings().await?;
            if cli.json {
                output::print_json(&mappings)?;
            } else {
                println!("{}", output::field_mappings_table(&mappings));
            }
        }
        Command::DeleteFieldMapping(name) => {
            if registry.delete_field_mapping(&name).await? {
                println!("Field mapping {name} deleted.");
            } else {
                println!("No field mapping for {name}.");
            }
        }
        Command::AddFolderMapping {
            tbl_name,
            actual_folder_name,
        } => {
            registry
                .add_folder_mapping(&tbl_name, &actual_folder_name)
                .await?;
            println!("Folder mapping {tbl_name} -> {actual_folder_name} added.");
        }
        Command::ViewFolderMappings => {
            let mappings = registry.list_folder_mappings().await?;
            if cli.json {
                output::print_json(&mappings)?;
            } else {
                println!("{}", output::folder_mappings_table(&mappings));
            }
        }
        Command::DeleteFolderMapping(name) => {
            if registry.delete_folder_mapping(&name).await? {
                println!("Folder mapping {name} deleted.");
            } else {
                println!("No folder mapping for {name}.");
            }
        }
        Command::Migrate => {}
    }

    Ok(())
}
