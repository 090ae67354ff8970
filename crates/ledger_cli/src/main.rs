use std::error::Error;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ledger::{
    AccountStatus, Currency, DepositCmd, Engine, EngineConfig, Money, TransferCmd, WithdrawCmd,
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

mod settings;

#[derive(Parser, Debug)]
#[command(name = "ledger_cli")]
#[command(about = "Wallet ledger: accounts, deposits, withdrawals and transfers")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "settings")]
    config: String,

    /// Database connection string (also read from `DATABASE_URL`).
    /// Takes precedence over the settings file.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply or inspect schema migrations.
    Migrate {
        #[arg(value_enum, default_value_t = MigrateAction::Up)]
        action: MigrateAction,
    },
    Account(AccountArgs),
    Deposit(MovementArgs),
    Withdraw(MovementArgs),
    Transfer(TransferArgs),
    History(HistoryArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum MigrateAction {
    Up,
    Down,
    Fresh,
    Status,
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Open {
        #[arg(long)]
        owner: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "IDR")]
        currency: Currency,
    },
    Show {
        id: Uuid,
    },
    List {
        #[arg(long)]
        owner: Uuid,
    },
    Status {
        id: Uuid,
        #[arg(value_enum)]
        status: StatusArg,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
    Active,
    Inactive,
    Frozen,
}

impl From<StatusArg> for AccountStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Active => AccountStatus::Active,
            StatusArg::Inactive => AccountStatus::Inactive,
            StatusArg::Frozen => AccountStatus::Frozen,
        }
    }
}

#[derive(Args, Debug)]
struct MovementArgs {
    account: Uuid,
    amount: Money,
    #[arg(long, default_value = "")]
    description: String,
    /// Retrying with the same key never applies the operation twice.
    #[arg(long)]
    idempotency_key: Option<String>,
}

#[derive(Args, Debug)]
struct TransferArgs {
    from: Uuid,
    to: Uuid,
    amount: Money,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long)]
    idempotency_key: Option<String>,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    account: Uuid,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    limit: i64,
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    offset: i64,
}

#[derive(Serialize)]
struct BalanceView {
    account_id: Uuid,
    balance: Money,
}

fn movement(args: MovementArgs) -> DepositCmd {
    let mut cmd = DepositCmd::new(args.account, args.amount).description(args.description);
    if let Some(key) = args.idempotency_key {
        cmd = cmd.idempotency_key(key);
    }
    cmd
}

fn print<T: Serialize>(json: bool, value: &T, human: impl FnOnce() -> String) {
    if json {
        match serde_json::to_string_pretty(value) {
            Ok(text) => println!("{text}"),
            Err(err) => tracing::error!("failed to encode output: {err}"),
        }
    } else {
        println!("{}", human());
    }
}

async fn connect_db(url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let mut options = ConnectOptions::new(url);
    if url.contains(":memory:") {
        options.max_connections(1);
    }
    let db = Database::connect(options).await?;
    Ok(db)
}

async fn migrate(db: &DatabaseConnection, action: MigrateAction) -> Result<(), sea_orm::DbErr> {
    match action {
        MigrateAction::Up => Migrator::up(db, None).await,
        MigrateAction::Down => Migrator::down(db, None).await,
        MigrateAction::Fresh => Migrator::fresh(db).await,
        MigrateAction::Status => Migrator::status(db).await,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();
    let settings = settings::Settings::new(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "ledger_cli={level},ledger={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = settings.database_url(cli.database_url.as_deref());
    let db = connect_db(&url).await?;

    if let Command::Migrate { action } = cli.command {
        migrate(&db, action).await?;
        tracing::info!(?action, "migration finished");
        return Ok(());
    }
    Migrator::up(&db, None).await?;

    let engine = Engine::builder()
        .database(db)
        .config(EngineConfig::from(&settings.engine))
        .build()
        .await?;

    if let Err(err) = run(&engine, cli.command, cli.json).await {
        tracing::debug!(retryable = err.is_retryable(), "command failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(engine: &Engine, command: Command, json: bool) -> Result<(), ledger::EngineError> {
    match command {
        Command::Migrate { .. } => {}
        Command::Account(AccountArgs { command }) => match command {
            AccountCommand::Open {
                owner,
                name,
                currency,
            } => {
                let account = engine.open_account(owner, &name, currency).await?;
                print(json, &account, || {
                    format!("opened account: {} ({})", account.name, account.id)
                });
            }
            AccountCommand::Show { id } => {
                let account = engine.account(id).await?;
                print(json, &account, || {
                    format!(
                        "{} {} {} {} [{}]",
                        account.id,
                        account.name,
                        account.balance,
                        account.currency,
                        account.status.as_str()
                    )
                });
            }
            AccountCommand::List { owner } => {
                let accounts = engine.accounts_by_owner(owner).await?;
                print(json, &accounts, || {
                    accounts
                        .iter()
                        .map(|account| {
                            format!(
                                "{} {} {} {}",
                                account.id, account.name, account.balance, account.currency
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                });
            }
            AccountCommand::Status { id, status } => {
                let account = engine.set_account_status(id, status.into()).await?;
                print(json, &account, || {
                    format!("account {} is now {}", account.id, account.status.as_str())
                });
            }
        },
        Command::Deposit(args) => {
            let account_id = args.account;
            let balance = engine.deposit(movement(args)).await?;
            let view = BalanceView { account_id, balance };
            print(json, &view, || format!("balance: {balance}"));
        }
        Command::Withdraw(args) => {
            let account_id = args.account;
            let cmd: WithdrawCmd = movement(args);
            let balance = engine.withdraw(cmd).await?;
            let view = BalanceView { account_id, balance };
            print(json, &view, || format!("balance: {balance}"));
        }
        Command::Transfer(args) => {
            let mut cmd =
                TransferCmd::new(args.from, args.to, args.amount).description(args.description);
            if let Some(key) = args.idempotency_key {
                cmd = cmd.idempotency_key(key);
            }
            let outcome = engine.transfer(cmd).await?;
            print(json, &outcome, || {
                format!(
                    "transfer {}: source {}, destination {}",
                    outcome.reference_id, outcome.source_balance, outcome.destination_balance
                )
            });
        }
        Command::History(args) => {
            let rows = engine.history(args.account, args.limit, args.offset).await?;
            print(json, &rows, || {
                rows.iter()
                    .map(|row| {
                        format!(
                            "{} {:<10} {:>14} {:>14} -> {:<14} {}",
                            row.created_at.format("%Y-%m-%d %H:%M:%S"),
                            row.kind.as_str(),
                            row.amount,
                            row.balance_before,
                            row.balance_after,
                            row.description
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            });
        }
    }
    Ok(())
}
