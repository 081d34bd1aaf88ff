// KisanLog - command line
// Database setup, account creation and offline reports without the server

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use kisanlog::entities::expense::list_expenses;
use kisanlog::entities::user::{find_user_by_email, register_user};
use kisanlog::entities::yield_record::list_yields;
use kisanlog::logging::init_logger;
use kisanlog::{
    crop_analysis, farm_summary, open_database, render_analysis_table, report_filename,
    table_counts, write_csv_report, Registration, User,
};
use rusqlite::Connection;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kisanlog", version, about = "KisanLog farm bookkeeping")]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "KISANLOG_DB", default_value = "kisanlog.db", global = true)]
    db: PathBuf,

    /// Debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and its tables
    Init,
    /// Create a user account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "KISANLOG_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print per-crop profitability for a user
    Analysis {
        #[arg(long)]
        email: String,
    },
    /// Write the CSV report for a user
    Export {
        #[arg(long)]
        email: String,
        /// Output file (defaults to Farm_Report_<date>.csv)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose, false);

    let conn = open_database(&cli.db)?;

    match cli.command {
        Command::Init => run_init(&conn, &cli.db),
        Command::Register {
            name,
            email,
            password,
        } => run_register(&conn, name, email, password),
        Command::Analysis { email } => run_analysis(&conn, &email),
        Command::Export { email, out } => run_export(&conn, &email, out),
    }
}

fn run_init(conn: &Connection, path: &std::path::Path) -> Result<()> {
    let counts = table_counts(conn)?;
    println!("✓ Database ready at {}", path.display());
    println!(
        "  users: {}  sessions: {}  expenses: {}  yields: {}",
        counts.users, counts.sessions, counts.expenses, counts.yields
    );
    Ok(())
}

fn run_register(conn: &Connection, full_name: String, email: String, password: String) -> Result<()> {
    let user = register_user(
        conn,
        &Registration {
            full_name,
            email,
            password,
        },
    )?;
    println!("✓ Registered {} <{}>", user.full_name, user.email);
    Ok(())
}

fn lookup_user(conn: &Connection, email: &str) -> Result<User> {
    find_user_by_email(conn, email)?.with_context(|| format!("no user with email '{}'", email))
}

fn run_analysis(conn: &Connection, email: &str) -> Result<()> {
    let user = lookup_user(conn, email)?;
    let expenses = list_expenses(conn, &user.id)?;
    let yields = list_yields(conn, &user.id)?;

    let rows = crop_analysis(&expenses, &yields);
    let summary = farm_summary(&expenses, &yields);

    println!("📊 Crop analysis for {}", user.full_name);
    println!();
    print!("{}", render_analysis_table(&rows));
    println!();
    println!("Total expenses: ₹{:.2}", summary.total_expenses);
    println!("Total revenue:  ₹{:.2}", summary.total_revenue);
    println!("Net profit:     ₹{:.2}", summary.net_profit);
    Ok(())
}

fn run_export(conn: &Connection, email: &str, out: Option<PathBuf>) -> Result<()> {
    let user = lookup_user(conn, email)?;
    let expenses = list_expenses(conn, &user.id)?;
    let yields = list_yields(conn, &user.id)?;

    let now = Utc::now();
    let path = out.unwrap_or_else(|| PathBuf::from(report_filename(now.date_naive())));
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;

    write_csv_report(BufWriter::new(file), &expenses, &yields, now)?;

    tracing::info!(path = %path.display(), user_id = %user.id, "report exported");
    println!(
        "✓ Exported {} expenses and {} yields to {}",
        expenses.len(),
        yields.len(),
        path.display()
    );
    Ok(())
}
