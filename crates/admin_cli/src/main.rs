use std::{error::Error, fs::File, io::BufReader, path::Path, path::PathBuf};

use clap::{Args, Parser, Subcommand};
use engine::{
    Engine, IngestReport, MaskSort, PurchaseCmd,
    transform::{PharmacyDocument, UserDocument},
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::de::DeserializeOwned;

#[derive(Parser, Debug)]
#[command(name = "phantom_mask_admin")]
#[command(about = "Admin utilities for Phantom Mask (load documents, buy masks)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./phantom_mask.db?mode=rwc"
    )]
    database_url: String,

    /// Log filter, e.g. `engine=debug`.
    #[arg(long, env = "RUST_LOG", default_value = "engine=info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load pharmacy and user documents. Pharmacies are loaded first so that
    /// purchase histories can resolve their masks.
    Load(LoadArgs),
    /// Buy one mask on behalf of a user.
    Purchase(PurchaseArgs),
    /// List the masks of a pharmacy with their ids.
    Masks(MasksArgs),
}

#[derive(Args, Debug)]
struct LoadArgs {
    #[arg(long)]
    pharmacies: Option<PathBuf>,
    #[arg(long)]
    users: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PurchaseArgs {
    /// User name.
    #[arg(long)]
    user: String,
    /// Pharmacy name.
    #[arg(long)]
    pharmacy: String,
    /// Mask id, as printed by `masks`.
    #[arg(long)]
    mask: i32,
    /// Idempotency key; repeating a purchase with the same key is a no-op.
    #[arg(long)]
    key: Option<String>,
}

#[derive(Args, Debug)]
struct MasksArgs {
    #[arg(long)]
    pharmacy: String,
    /// `name` or `price`.
    #[arg(long, default_value = "name")]
    sort: String,
}

/// Reads a JSON array of documents from `path`.
fn load_json_file<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, Box<dyn Error + Send + Sync>> {
    let file = File::open(path).map_err(|err| format!("{}: {err}", path.display()))?;
    let docs = serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("{}: {err}", path.display()))?;
    Ok(docs)
}

fn print_report(label: &str, report: &IngestReport) {
    println!(
        "{label}: {} inserted, {} skipped, {} rejected",
        report.inserted,
        report.skipped,
        report.rejected.len()
    );
    for rejected in &report.rejected {
        eprintln!("  {}: {}", rejected.record, rejected.reason);
    }
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log.as_str())
        .with_writer(std::io::stderr)
        .init();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Load(args) => {
            if args.pharmacies.is_none() && args.users.is_none() {
                eprintln!("provide --pharmacies and/or --users");
                std::process::exit(2);
            }
            if let Some(path) = args.pharmacies {
                let docs: Vec<PharmacyDocument> = load_json_file(&path)?;
                let report = engine.ingest_pharmacies(&docs).await?;
                print_report("pharmacies", &report);
            }
            if let Some(path) = args.users {
                let docs: Vec<UserDocument> = load_json_file(&path)?;
                let report = engine.ingest_users(&docs).await?;
                print_report("users", &report);
            }
        }
        Command::Purchase(args) => {
            let user_id = engine.user_id(&args.user).await?;
            let pharmacy_id = engine.pharmacy_account_id(&args.pharmacy).await?;
            let mut cmd = PurchaseCmd::new(user_id, pharmacy_id, args.mask);
            if let Some(key) = args.key {
                cmd = cmd.idempotency_key(key);
            }
            let record = engine.purchase(cmd).await?;
            let user = engine.user(user_id).await?;
            println!(
                "purchase {}: {} paid {} to {} on {}; balance now {}",
                record.id,
                user.name,
                record.trn_amount,
                record.pharmacy_name,
                record.trn_date,
                user.cash_balance
            );
        }
        Command::Masks(args) => {
            let sort: MaskSort = args.sort.parse()?;
            for mask in engine.pharmacy_masks(&args.pharmacy, sort).await? {
                println!(
                    "{:>5}  {} ({}) ({} per pack)  {}",
                    mask.id, mask.mask_name, mask.color, mask.pack_quantity, mask.price
                );
            }
        }
    }

    Ok(())
}
