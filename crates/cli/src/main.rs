use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use testpool_pool::{
    pool_lock_wait_ms_last, pool_lock_wait_ms_max, FixtureRecord, FixturePool, LockConfig,
    TypeStatus, POOL_DIR_NAME, PRODUCTS, USERS,
};

mod report;
mod serve;

#[derive(Parser)]
#[command(name = "testpool")]
#[command(about = "Pooled test data for parallel test workers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Environment to operate on (default: $TEST_ENV, then qa)
    #[arg(long, global = true)]
    env: Option<String>,

    /// Directory holding pool stores and reports
    #[arg(long, global = true, default_value = POOL_DIR_NAME)]
    data_dir: PathBuf,

    /// Lock retries before giving up
    #[arg(long, global = true)]
    lock_retries: Option<u32>,

    /// First lock backoff in milliseconds
    #[arg(long, global = true)]
    lock_backoff_ms: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show pool status for the active environment
    Status(StatusArgs),

    /// Reset every fixture in the active environment to available
    Cleanup,

    /// Acquire one fixture and print it as JSON
    Acquire(AcquireArgs),

    /// Release a fixture back to its pool
    Release(ReleaseArgs),

    /// Summarize every registered environment
    Environments,

    /// Acquire-and-release round trip across all environments
    Exercise,

    /// Serve pool status and cleanup over HTTP
    Serve(ServeArgs),
}

#[derive(Args)]
struct StatusArgs {
    /// Emit the full aggregate as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct AcquireArgs {
    /// Fixture type to draw from (users, products, orders)
    #[arg(long = "type")]
    fixture_type: String,

    /// Identity recorded as the holder
    #[arg(long, default_value = "default")]
    holder: String,
}

#[derive(Args)]
struct ReleaseArgs {
    /// Fixture type the record belongs to
    #[arg(long = "type")]
    fixture_type: String,

    /// Record id to return to the pool
    #[arg(long)]
    id: String,
}

#[derive(Args)]
struct ServeArgs {
    #[arg(long, default_value_t = 3001)]
    port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match &cli.command {
        Commands::Status(args) => cmd_status(&cli, args.json).await,
        Commands::Cleanup => cmd_cleanup(&cli).await,
        Commands::Acquire(args) => cmd_acquire(&cli, args).await,
        Commands::Release(args) => cmd_release(&cli, args).await,
        Commands::Environments => cmd_environments(&cli).await,
        Commands::Exercise => cmd_exercise(&cli).await,
        Commands::Serve(args) => cmd_serve(&cli, args.port).await,
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .init();
}

/// `--env` wins; otherwise `TEST_ENV`, read once here, then the default.
fn resolve_environment(cli: &Cli) -> Result<&'static testpool_environments::EnvironmentConfig> {
    match &cli.env {
        Some(key) => Ok(testpool_environments::environment(key)?),
        None => Ok(testpool_environments::environment_from_env()?),
    }
}

fn lock_config(cli: &Cli) -> LockConfig {
    let mut config = LockConfig::default();
    if let Some(retries) = cli.lock_retries {
        config.max_retries = retries;
    }
    if let Some(backoff_ms) = cli.lock_backoff_ms {
        config.first_backoff = Duration::from_millis(backoff_ms);
    }
    config
}

fn open_pool(cli: &Cli) -> Result<FixturePool> {
    let pool = FixturePool::for_config(resolve_environment(cli)?, &cli.data_dir);
    Ok(pool.with_lock_config(lock_config(cli)))
}

fn open_pool_for(cli: &Cli, key: &str) -> Result<FixturePool> {
    let pool = FixturePool::new(key, &cli.data_dir)?;
    Ok(pool.with_lock_config(lock_config(cli)))
}

async fn cmd_status(cli: &Cli, json: bool) -> Result<()> {
    let pool = open_pool(cli)?;
    let status = pool.status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let env = pool.environment();
    println!("{} data pool ({})", env.name, env.key);
    print_status_table(&status);
    Ok(())
}

async fn cmd_cleanup(cli: &Cli) -> Result<()> {
    let pool = open_pool(cli)?;
    pool.cleanup().await?;
    log::debug!(
        "lock wait: {}ms (max {}ms)",
        pool_lock_wait_ms_last(),
        pool_lock_wait_ms_max()
    );

    let status = pool.status().await?;
    println!("pool status after cleanup:");
    print_status_table(&status);
    Ok(())
}

async fn cmd_acquire(cli: &Cli, args: &AcquireArgs) -> Result<()> {
    let pool = open_pool(cli)?;
    let record = pool.acquire(&args.fixture_type, &args.holder).await?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

async fn cmd_release(cli: &Cli, args: &ReleaseArgs) -> Result<()> {
    let pool = open_pool(cli)?;
    pool.release(&args.id, &args.fixture_type).await?;
    println!("released {}: {}", args.fixture_type, args.id);
    Ok(())
}

async fn cmd_environments(cli: &Cli) -> Result<()> {
    for key in testpool_environments::environment_keys() {
        let pool = open_pool_for(cli, key)?;
        let env = pool.environment();
        let status = pool.status().await?;

        println!("\n{} environment ({})", env.name, env.key);
        println!("  Base URL: {}", env.base_url);
        println!("  API URL:  {}", env.api_url);

        if let Some(users) = status.get(USERS) {
            println!("  Users ({} total, {} available):", users.total, users.available);
            for (index, record) in users.records.iter().enumerate() {
                println!(
                    "    {}. {} ({}) - {}",
                    index + 1,
                    record.attribute_str("username").unwrap_or("?"),
                    record.attribute_str("role").unwrap_or("?"),
                    status_label(record),
                );
            }
        }
        if let Some(products) = status.get(PRODUCTS) {
            println!(
                "  Products ({} total, {} available):",
                products.total, products.available
            );
            for (index, record) in products.records.iter().enumerate() {
                println!(
                    "    {}. {} - ${} ({})",
                    index + 1,
                    record.attribute_str("name").unwrap_or("?"),
                    record
                        .attributes
                        .get("price")
                        .map(ToString::to_string)
                        .unwrap_or_else(|| "?".to_string()),
                    record.attribute_str("sku").unwrap_or("?"),
                );
            }
        }
    }
    Ok(())
}

async fn cmd_exercise(cli: &Cli) -> Result<()> {
    for key in testpool_environments::environment_keys() {
        // Fresh handle per environment; handles are never reused across
        // environments.
        let pool = open_pool_for(cli, key)?;
        let name = pool.environment().name.clone();

        match exercise_environment(&pool).await {
            Ok(()) => {
                report::append_result(&cli.data_dir, report::TestResult::passed(key, "exercise"))
                    .await?;
                println!("{name} environment: PASSED");
            }
            Err(err) => {
                report::append_result(
                    &cli.data_dir,
                    report::TestResult::failed(key, "exercise", err.to_string()),
                )
                .await?;
                println!("{name} environment: FAILED");
                return Err(err);
            }
        }
    }
    Ok(())
}

async fn exercise_environment(pool: &FixturePool) -> Result<()> {
    let env = pool.environment();
    let holder = format!("exercise-{}", env.key);

    println!("\nexercising {} ({})", env.name, env.key);
    println!("  base URL: {}", env.base_url);

    let user = pool.acquire(USERS, &holder).await?;
    println!(
        "  acquired user {} ({})",
        user.id,
        user.attribute_str("username").unwrap_or("?")
    );
    let product = pool.acquire(PRODUCTS, &holder).await?;
    println!(
        "  acquired product {} ({})",
        product.id,
        product.attribute_str("name").unwrap_or("?")
    );

    let status = pool.status().await?;
    println!(
        "  users {}/{} available, products {}/{} available",
        status[USERS].available,
        status[USERS].total,
        status[PRODUCTS].available,
        status[PRODUCTS].total
    );

    pool.release(&user.id, USERS).await?;
    pool.release(&product.id, PRODUCTS).await?;

    let status = pool.status().await?;
    anyhow::ensure!(
        status[USERS].available == status[USERS].total,
        "users not fully released"
    );
    anyhow::ensure!(
        status[PRODUCTS].available == status[PRODUCTS].total,
        "products not fully released"
    );
    Ok(())
}

async fn cmd_serve(cli: &Cli, port: u16) -> Result<()> {
    let pool = open_pool(cli)?;
    serve::serve(pool, cli.data_dir.clone(), port).await
}

fn print_status_table(status: &std::collections::BTreeMap<String, TypeStatus>) {
    for (fixture_type, aggregate) in status {
        println!("\n{}:", fixture_type.to_uppercase());
        println!("  Total: {}", aggregate.total);
        println!("  Available: {}", aggregate.available);
        println!("  In use: {}", aggregate.in_use);
        for record in aggregate.records.iter().filter(|r| !r.is_available()) {
            println!(
                "    {} held by {}",
                record.id,
                record.holder.as_deref().unwrap_or("?")
            );
        }
    }
}

fn status_label(record: &FixtureRecord) -> &'static str {
    if record.is_available() {
        "available"
    } else {
        "in-use"
    }
}
