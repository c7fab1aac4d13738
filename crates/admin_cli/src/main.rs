use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{
    AccountRef, Bucket, CreatorEarningsCredit, Engine, LedgerEntryType, LedgerRef, Money, OwnerType,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "wallet_admin")]
#[command(about = "Admin utilities for the wallet ledger (balances, earnings, reconciliation)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print all bucket balances for a user.
    Balances(BalancesArgs),
    Earnings(Earnings),
    /// Credit or debit a bucket directly, recorded as an adjustment.
    Adjust(AdjustArgs),
    /// Recompute an owner's balances from the ledger and report drift.
    Reconcile(ReconcileArgs),
}

#[derive(Args, Debug)]
struct BalancesArgs {
    #[arg(long)]
    user: String,
}

#[derive(Args, Debug)]
struct Earnings {
    #[command(subcommand)]
    command: EarningsCommand,
}

#[derive(Subcommand, Debug)]
enum EarningsCommand {
    /// Credit creator earnings, idempotent on --external-ref.
    Credit(EarningsCreditArgs),
    /// Move creator earnings into the stakeable balance.
    Move(EarningsMoveArgs),
    /// Show recent earnings activity.
    History(EarningsHistoryArgs),
}

#[derive(Args, Debug)]
struct EarningsCreditArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    amount: Money,
    #[arg(long)]
    external_ref: String,
    #[arg(long, default_value = "Creator earnings credit")]
    description: String,
    #[arg(long)]
    prediction: Option<String>,
}

#[derive(Args, Debug)]
struct EarningsMoveArgs {
    #[arg(long)]
    user: String,
    #[arg(long)]
    amount: Money,
}

#[derive(Args, Debug)]
struct EarningsHistoryArgs {
    #[arg(long)]
    user: String,
    #[arg(long, default_value_t = 20)]
    limit: u64,
}

#[derive(Args, Debug)]
struct AdjustArgs {
    #[arg(long)]
    user: String,
    #[arg(long, value_parser = parse_bucket)]
    bucket: Bucket,
    /// Positive credits, `--debit` flips it to a debit.
    #[arg(long)]
    amount: Money,
    #[arg(long, default_value_t = false)]
    debit: bool,
    #[arg(long)]
    note: Option<String>,
}

#[derive(Args, Debug)]
struct ReconcileArgs {
    #[arg(long, value_parser = parse_owner_type, default_value = "user")]
    owner_type: OwnerType,
    #[arg(long)]
    owner: String,
}

fn parse_bucket(raw: &str) -> Result<Bucket, String> {
    Bucket::try_from(raw).map_err(|err| err.to_string())
}

fn parse_owner_type(raw: &str) -> Result<OwnerType, String> {
    OwnerType::try_from(raw).map_err(|err| err.to_string())
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
    let settings = settings::Settings::load().unwrap_or_default();
    let level = settings.log_level.as_deref().unwrap_or("info");
    tracing_subscriber::fmt()
        .with_env_filter(format!("wallet_admin={level},engine={level}"))
        .init();

    let cli = Cli::parse();
    let database_url = cli
        .database_url
        .or(settings.database_url)
        .unwrap_or_else(|| "sqlite:./wallet.db?mode=rwc".to_string());

    let db = connect_db(&database_url).await?;
    let engine = Engine::builder().database(db).build();

    match cli.command {
        Command::Balances(args) => {
            let balances = engine.get_balances(&args.user).await?;
            let mut buckets: Vec<_> = balances.into_iter().collect();
            buckets.sort_by_key(|(bucket, _)| bucket.rank());
            for (bucket, balance) in buckets {
                println!("{:<18} {balance}", bucket.as_str());
            }
        }
        Command::Earnings(Earnings {
            command: EarningsCommand::Credit(args),
        }) => {
            let outcome = engine
                .credit_creator_earnings(&CreatorEarningsCredit {
                    user_id: args.user,
                    amount: args.amount,
                    description: args.description,
                    external_ref: args.external_ref,
                    prediction_id: args.prediction,
                    reference_id: None,
                    metadata: None,
                })
                .await?;
            if outcome.applied {
                println!("credited, earnings now {}", outcome.balances.creator_earnings);
            } else {
                println!(
                    "already applied, earnings unchanged at {}",
                    outcome.balances.creator_earnings
                );
            }
        }
        Command::Earnings(Earnings {
            command: EarningsCommand::Move(args),
        }) => {
            let outcome = engine
                .transfer_creator_earnings_to_stake(&args.user, args.amount)
                .await?;
            println!(
                "moved {} to stake (tx {}), stake now {}",
                args.amount, outcome.transaction_id, outcome.balances.stake_balance
            );
        }
        Command::Earnings(Earnings {
            command: EarningsCommand::History(args),
        }) => {
            let rows = engine
                .creator_earnings_history(&args.user, args.limit)
                .await?;
            for row in rows {
                println!(
                    "{} {:<7} {:<14} {} {}",
                    row.created_at,
                    row.direction,
                    row.channel,
                    Money::from_minor(row.amount_minor),
                    row.description.unwrap_or_default()
                );
            }
        }
        Command::Adjust(args) => {
            let account = AccountRef::user(args.user.as_str(), args.bucket);
            let mut reference = LedgerRef::new(LedgerEntryType::Adjustment);
            if let Some(note) = args.note {
                reference = reference.reference("admin_note", note);
            }
            if args.debit {
                let outcome = engine.debit(&account, args.amount, &reference).await?;
                println!("debited, balance now {}", outcome.from_balance);
            } else {
                let outcome = engine.credit(&account, args.amount, &reference).await?;
                println!("credited, balance now {}", outcome.to_balance);
            }
        }
        Command::Reconcile(args) => {
            let drift = engine.reconcile_owner(args.owner_type, &args.owner).await?;
            if drift.is_empty() {
                println!("ok: accounts match the ledger");
            } else {
                for entry in drift {
                    println!(
                        "DRIFT {:<18} ledger={} account={}",
                        entry.bucket.as_str(),
                        entry.ledger_balance,
                        entry.account_balance
                    );
                }
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
