use form_builder_core::config::BackendConfig;
use form_builder_core::domains::core::backend::{ApiFormsBackend, FormsBackend};
use form_builder_core::domains::submission::export::{export_to_file, to_csv_string, CsvOptions};
use form_builder_core::domains::submission::reconcile;
use clap::Parser;
use std::path::PathBuf;

/// Print a form's submissions as CSV, one column per input field.
#[derive(Parser)]
#[command(name = "forms_inspect")]
#[command(about = "Reconcile and export the submissions of one form", long_about = None)]
struct Cli {
    /// Form to export
    form_id: String,

    /// Write the CSV to this file instead of stdout
    #[arg(long, short)]
    out: Option<PathBuf>,

    /// Prefix the written file with a UTF-8 byte order mark
    #[arg(long)]
    bom: bool,

    /// Bearer token for the backend
    #[arg(long, env = "FORMS_SESSION_TOKEN", hide_env_values = true)]
    session_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = env_logger::try_init();

    let cli = Cli::parse();

    let mut config = BackendConfig::from_env()?;
    if let Some(token) = cli.session_token.as_deref().filter(|t| !t.trim().is_empty()) {
        config.session_token = Some(token.to_string());
    }
    let backend = ApiFormsBackend::new(&config)?;
    let table = reconcile::fetch_table(&backend as &dyn FormsBackend, &cli.form_id).await?;

    let incomplete = table.rows.iter().filter(|row| !row.is_complete()).count();
    eprintln!(
        "Form {}: {} column(s), {} submission(s), {} missing required answers",
        table.form_id,
        table.columns.len(),
        table.rows.len(),
        incomplete
    );

    match cli.out {
        Some(path) => {
            export_to_file(&table, &path, CsvOptions { with_bom: cli.bom, ..CsvOptions::default() })?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", to_csv_string(&table)?),
    }
    Ok(())
}
