use std::path::PathBuf;

use clap::{Parser, Subcommand};

use tasktrack::storage::repository;
use tasktrack::{Config, Database, StatsReport, TaskTracker};

#[derive(Parser)]
#[command(name = "tasktrack", about = "Personal task tracker server and tools")]
struct Cli {
    /// Database path (default: $TASKTRACK_DB or ~/.tasktrack/tasktrack.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        /// Port to listen on (default: $PORT or 3005)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print task statistics for one user
    Stats {
        /// User id or email
        user: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show database row counts
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = Config::from_env()?;

    let db = match cli.db.as_deref().map(PathBuf::from).or_else(|| config.db_path.clone()) {
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };

    match cli.command {
        Commands::Serve { port } => {
            serve(db, &config, port.unwrap_or(config.port)).await?;
        }
        Commands::Stats { user, json } => {
            let owner = db
                .reader()
                .call({
                    let user = user.clone();
                    move |c| repository::resolve_user_identifier(c, &user)
                })
                .await?
                .ok_or_else(|| anyhow::anyhow!("No user matching '{user}'"))?;
            let report = tasktrack::compute_stats(&db, owner).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_stats(&user, &report);
            }
        }
        Commands::Status => {
            print_status(&db).await?;
        }
    }

    Ok(())
}

async fn serve(db: Database, config: &Config, port: u16) -> anyhow::Result<()> {
    let tracker = TaskTracker::from_config(db, config)?;
    let app = tasktrack::api::router(tasktrack::api::AppState::new(tracker));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    eprintln!("Server listening on port {port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for shutdown signal: {e}");
            }
            log::info!("Shutting down");
        })
        .await?;
    Ok(())
}

fn print_stats(user: &str, report: &StatsReport) {
    println!("Task statistics for {user}");
    println!("  Total:      {}", report.total_tasks);
    println!(
        "  Completed:  {}{}",
        report.task_completed,
        percent(report.completed_percentage)
    );
    println!(
        "  Pending:    {}{}",
        report.task_pending,
        percent(report.pending_percentage)
    );
    println!("  Avg completion time:  {:.1}h", report.avg_completion_time);
    println!("  Total time spent:     {:.1}h", report.total_time_spent);
    println!("  Pending time lapsed:  {:.1}h", report.total_pending_time_lapsed);
    println!("  Pending time left:    {:.1}h", report.total_pending_time_remaining);

    if !report.pending_tasks_by_priority.is_empty() {
        println!();
        println!("  {:<9} {:>7} {:>10} {:>10}", "Priority", "Pending", "Lapsed", "Remaining");
        for (priority, bucket) in &report.pending_tasks_by_priority {
            println!(
                "  {:<9} {:>7} {:>9.1}h {:>9.1}h",
                priority, bucket.pending_tasks, bucket.time_lapsed, bucket.time_remaining
            );
        }
    }
}

fn percent(value: Option<f64>) -> String {
    value.map(|p| format!(" ({p:.1}%)")).unwrap_or_default()
}

async fn print_status(db: &Database) -> anyhow::Result<()> {
    let (users, tasks, pending, done) = db.reader().call(|c| repository::count_rows(c)).await?;
    println!("Tracker Status");
    println!("  Users:    {users}");
    println!("  Tasks:    {tasks}");
    println!("  Pending:  {pending}");
    println!("  Done:     {done}");
    let other = tasks - pending - done;
    if other > 0 {
        println!("  Other:    {other}");
    }
    Ok(())
}
