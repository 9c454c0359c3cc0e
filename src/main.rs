use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};

use bizdoc_pdf::{
    AssetLoader, BATCH_SIZE, BusinessSettings, CodeStore, DocumentData, DocumentRenderer, Error, LayoutConfig,
    OutputMode, PrintOptions, Rendered,
};

#[derive(Parser)]
#[command(version, about = "Render invoices, quotations, purchase orders and receipts to PDF")]
struct Cli {
    /// Business settings JSON used to fill fields the document leaves empty
    #[arg(long, global = true, env = "BIZDOC_SETTINGS")]
    settings: Option<PathBuf>,

    /// Download code store; when set, `save` requires a valid `--code`
    #[arg(long = "codes", global = true, env = "BIZDOC_CODES")]
    code_store: Option<PathBuf>,

    /// Layout configuration JSON overriding positions and sizes
    #[arg(long, global = true)]
    layout: Option<PathBuf>,

    /// Seconds to wait for a logo or signature before skipping it
    #[arg(long, global = true, default_value_t = 10)]
    image_timeout: u64,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write <type>_<number>.pdf
    Save {
        input: PathBuf,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
        /// One-time download code, consumed on success
        #[arg(long)]
        code: Option<String>,
    },
    /// Print a data:application/pdf URL for embedding
    Preview {
        input: PathBuf,
        /// Write the URL here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Send the PDF to a printer
    Print {
        input: PathBuf,
        #[arg(short = 'd', long)]
        printer: Option<String>,
        #[arg(long, default_value = "lp", env = "BIZDOC_PRINT_COMMAND")]
        command: String,
    },
    /// Manage business settings files
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Issue and check one-time download codes (needs --codes)
    Codes {
        #[command(subcommand)]
        action: CodesAction,
    },
}

#[derive(Subcommand)]
enum CodesAction {
    /// Add a batch of codes valid for one year and print them
    Generate {
        #[arg(short = 'n', long, default_value_t = BATCH_SIZE)]
        count: usize,
    },
    /// Consume a code
    Verify { code: String },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Copy settings to business_settings_<timestamp>.json with an export date
    Export {
        file: PathBuf,
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },
    /// Write a settings file with default values
    Init { path: PathBuf },
}

fn load_document(input: &Path, settings: Option<&BusinessSettings>) -> Result<DocumentData, Error> {
    let mut doc = DocumentData::load(input)?;
    if let Some(settings) = settings {
        settings.apply_to(&mut doc);
    }
    Ok(doc)
}

async fn run(cli: Cli) -> Result<(), Error> {
    let settings = cli
        .settings
        .as_deref()
        .map(BusinessSettings::load)
        .transpose()?;
    let config = match cli.layout.as_deref() {
        Some(path) => LayoutConfig::load(path)?,
        None => LayoutConfig::default(),
    };
    let renderer = || -> Result<DocumentRenderer, Error> {
        let images = AssetLoader::new(Duration::from_secs(cli.image_timeout))?;
        Ok(DocumentRenderer::with_images(config.clone(), images))
    };

    let (input, mode) = match cli.command {
        Command::Save {
            ref input,
            ref out_dir,
            ref code,
        } => {
            if let Some(store) = cli.code_store.as_deref() {
                redeem(store, code.as_deref().unwrap_or_default())?;
            }
            (
                input,
                OutputMode::Save {
                    dir: out_dir.clone(),
                },
            )
        }
        Command::Preview { ref input, .. } => (input, OutputMode::Preview),
        Command::Print {
            ref input,
            ref printer,
            ref command,
        } => (
            input,
            OutputMode::Print(PrintOptions {
                command: command.clone(),
                printer: printer.clone(),
                ..PrintOptions::default()
            }),
        ),
        Command::Settings { ref action } => return settings_command(action),
        Command::Codes { ref action } => return codes_command(cli.code_store.as_deref(), action),
    };

    let doc = load_document(input, settings.as_ref())?;
    match renderer()?.render(&doc, mode).await? {
        Rendered::Saved(path) => println!("{}", path.display()),
        Rendered::Preview(url) => match &cli.command {
            Command::Preview {
                output: Some(path), ..
            } => std::fs::write(path, url)?,
            _ => println!("{url}"),
        },
        Rendered::Printed(job) => job.wait().await,
    }
    Ok(())
}

fn settings_command(action: &SettingsAction) -> Result<(), Error> {
    match action {
        SettingsAction::Export { file, out_dir } => {
            let now = chrono::Utc::now();
            let loaded = BusinessSettings::load(file)?;
            let path = out_dir.join(BusinessSettings::export_file_name(now));
            let json = serde_json::to_string_pretty(&loaded.export(now))
                .map_err(|e| Error::Settings(e.to_string()))?;
            std::fs::write(&path, json)?;
            println!("{}", path.display());
        }
        SettingsAction::Init { path } => {
            BusinessSettings::default().save(path)?;
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn redeem(store_path: &Path, code: &str) -> Result<(), Error> {
    let mut store = CodeStore::load(store_path)?;
    store.verify(code, chrono::Utc::now())?;
    store.save(store_path)
}

fn codes_command(store_path: Option<&Path>, action: &CodesAction) -> Result<(), Error> {
    let store_path =
        store_path.ok_or_else(|| Error::Code("no code store given, pass --codes <file>".into()))?;
    match action {
        CodesAction::Generate { count } => {
            let mut store = CodeStore::load(store_path)?;
            for code in store.generate(*count, chrono::Utc::now()) {
                println!("{code}");
            }
            store.save(store_path)?;
        }
        CodesAction::Verify { code } => {
            redeem(store_path, code)?;
            println!("Code verified");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
