use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use ddbctl::client::{ClientConfig, DynamoClient};
use ddbctl::commands::{self, UserTransaction};
use ddbctl::sample::{DEFAULT_TABLE, TEST_TABLE};

#[derive(Parser, Debug)]
#[command(name = "ddbctl", version, about = "DynamoDB table, index, item and transaction call-throughs")]
struct Cli {
    /// AWS region
    #[arg(long, global = true, env = "AWS_DEFAULT_REGION")]
    region: Option<String>,

    /// Named profile from the shared credentials file
    #[arg(long, global = true, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Custom endpoint, e.g. http://localhost:8000 for DynamoDB Local
    #[arg(long, global = true, env = "DYNAMODB_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug, Clone, Copy)]
struct WaitArgs {
    /// Seconds between status checks
    #[arg(long)]
    delay: Option<u64>,

    /// Give up after this many checks
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check connectivity with a one-table ListTables call
    Ping,
    /// Create the music table and wait until it is active
    CreateTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Delete a table and wait until it is gone
    DeleteTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Delete the table if present, then create it again
    RecreateTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait for table_exists or table_not_exists
    TableWaiter {
        #[arg(default_value = "table_exists")]
        waiter: String,
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Put the sample song with a random length
    PutItem {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
    },
    /// Write numbered sample songs
    BatchWrite {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long, default_value_t = 100)]
        amount: u32,
    },
    /// Get a sample song by number
    GetItem {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long, default_value_t = 1)]
        idx: u32,
    },
    /// Set Length and Awards on a sample song
    UpdateItem {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        idx: Option<u32>,
        #[arg(long, default_value_t = 99)]
        value: i64,
        /// NONE, ALL_OLD, UPDATED_OLD, ALL_NEW or UPDATED_NEW
        #[arg(long, default_value = "ALL_NEW")]
        return_values: String,
    },
    /// Delete a sample song
    DeleteItem {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        idx: Option<u32>,
    },
    /// Full scan plus a Length/Awards filtered scan
    ScanTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long, default_value_t = 1)]
        length: u32,
        #[arg(long, default_value_t = 1)]
        awards: u32,
    },
    /// Query the first numbered artist's songs
    QueryTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
    },
    /// Top songs of an album by length, via the album/length index
    QueryTop {
        #[arg(long, default_value = DEFAULT_TABLE)]
        table: String,
        #[arg(long, default_value = "Album Title")]
        album: String,
        #[arg(long, default_value_t = 3)]
        top: i32,
        /// Longest first
        #[arg(long)]
        desc: bool,
    },
    /// Start building the Length index
    CreateIndex {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
    },
    /// Start deleting an index
    DeleteIndex {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
    },
    /// Show an index's status, optionally until it disappears
    IndexStatus {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
        #[arg(long)]
        watch: bool,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait for an index to be active, exist or not exist
    WaitIndex {
        condition: String,
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Drop the Length index if present and build it again
    RecreateIndex {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Wait for the Length index, then query it
    QueryIndex {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        index: Option<String>,
        #[arg(long, default_value_t = 1)]
        length: u32,
        #[command(flatten)]
        wait: WaitArgs,
    },
    /// Start an on-demand backup
    BackupTable {
        #[arg(long, default_value = TEST_TABLE)]
        table: String,
        #[arg(long)]
        backup_name: Option<String>,
    },
    /// Insert a user into both music tables atomically
    TransactCreateUser(TransactArgs),
    /// Overwrite a user in both music tables atomically
    TransactUpdateNewUser(TransactArgs),
    /// Add a second song for an existing user
    TransactUpdateUser(TransactArgs),
}

#[derive(Args, Debug)]
struct TransactArgs {
    #[arg(long, default_value = "default")]
    artist: String,
    #[arg(long, default_value = "default")]
    song_title: String,
    /// Random when omitted
    #[arg(long)]
    length: Option<u32>,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(client: &DynamoClient, command: Command) -> Result<Value, Box<dyn std::error::Error>> {
    let table_change_wait =
        |w: WaitArgs| commands::table_change_wait_config(w.delay, w.max_attempts);
    let table_wait = |w: WaitArgs| commands::table_wait_config(w.delay, w.max_attempts);
    let index_wait = |w: WaitArgs| commands::index_wait_config(w.delay, w.max_attempts);

    let value = match command {
        Command::Ping => commands::ping(client)?,
        Command::CreateTable { table, wait } => {
            commands::create_table_cmd(client, &table, &table_change_wait(wait))?
        }
        Command::DeleteTable { table, wait } => {
            commands::delete_table_cmd(client, &table, &table_change_wait(wait))?
        }
        Command::RecreateTable { table, wait } => {
            commands::recreate_table_cmd(client, &table, &table_wait(wait))?
        }
        Command::TableWaiter {
            waiter,
            table,
            wait,
        } => commands::table_waiter_cmd(client, &waiter, &table, &table_wait(wait))?,
        Command::PutItem { table } => commands::put_item_cmd(client, &table)?,
        Command::BatchWrite { table, amount } => {
            commands::batch_write_cmd(client, &table, commands::validate_amount(amount)?)?
        }
        Command::GetItem { table, idx } => commands::get_item_cmd(client, &table, Some(idx))?,
        Command::UpdateItem {
            table,
            idx,
            value,
            return_values,
        } => commands::update_item_cmd(client, &table, idx, value, &return_values)?,
        Command::DeleteItem { table, idx } => commands::delete_item_cmd(client, &table, idx)?,
        Command::ScanTable {
            table,
            length,
            awards,
        } => commands::scan_table_cmd(client, &table, length, awards)?,
        Command::QueryTable { table } => commands::query_table_cmd(client, &table)?,
        Command::QueryTop {
            table,
            album,
            top,
            desc,
        } => commands::query_top_cmd(client, &table, &album, top, !desc)?,
        Command::CreateIndex { table, index } => commands::create_index_cmd(client, &table, index)?,
        Command::DeleteIndex { table, index } => commands::delete_index_cmd(client, &table, index)?,
        Command::IndexStatus {
            table,
            index,
            watch,
            wait,
        } => {
            let watch = watch.then(|| index_wait(wait));
            commands::index_status_cmd(client, &table, index, watch.as_ref())?
        }
        Command::WaitIndex {
            condition,
            table,
            index,
            wait,
        } => commands::wait_index_cmd(client, &table, index, &condition, &index_wait(wait))?,
        Command::RecreateIndex { table, index, wait } => {
            commands::recreate_index_cmd(client, &table, index, &index_wait(wait))?
        }
        Command::QueryIndex {
            table,
            index,
            length,
            wait,
        } => commands::query_index_cmd(client, &table, index, length, &index_wait(wait))?,
        Command::BackupTable { table, backup_name } => {
            commands::backup_table_cmd(client, &table, backup_name)?
        }
        Command::TransactCreateUser(args) => transact(client, UserTransaction::CreateNewUser, args)?,
        Command::TransactUpdateNewUser(args) => {
            transact(client, UserTransaction::UpdateNewUser, args)?
        }
        Command::TransactUpdateUser(args) => transact(client, UserTransaction::UpdateUser, args)?,
    };
    Ok(value)
}

fn transact(
    client: &DynamoClient,
    kind: UserTransaction,
    args: TransactArgs,
) -> Result<Value, ddbctl::TransactionError> {
    commands::transact_user_cmd(client, kind, &args.artist, &args.song_title, args.length)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let client = DynamoClient::new(ClientConfig {
        region: cli.region,
        profile: cli.profile,
        endpoint_url: cli.endpoint_url,
        ..ClientConfig::default()
    })?;

    let value = run(&client, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
