mod commands;
mod output;

use clap::{Parser, Subcommand};
use mobile_master::{config, db, run_migrations};
use output::{OutputConfig, OutputFormat};
use std::process;

/// Maintenance CLI for the Mobile Master database
#[derive(Parser, Debug)]
#[clap(name = "mobile-master-admin", about = "Maintenance tasks for Mobile Master")]
struct Cli {
    /// Database URL to operate on
    #[clap(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    /// Output format
    #[clap(long, value_enum, default_value_t = OutputFormat::Human, global = true)]
    format: OutputFormat,

    /// Quiet mode: minimal output (just IDs or counts)
    #[clap(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a super admin account
    CreateSuperAdmin {
        #[clap(long)]
        name: String,
        #[clap(long)]
        email: String,
        #[clap(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Load a demo owner, shop, worker, and catalog
    Seed {
        /// Password for the demo owner and worker accounts
        #[clap(long, default_value = "demo-password")]
        password: String,
    },
    /// Create missing zero-stock inventory rows for products
    ReconcileStock,
    /// Delete rate-limit hits older than the window
    PurgeRateLimits {
        /// Hits older than this many seconds are deleted
        #[clap(long, default_value_t = 3600)]
        window_secs: u64,
    },
}

/// Resolves the database URL from CLI args, config file, or defaults
///
/// Precedence: CLI flag / env var > config file > default
fn resolve_database_url(cli_url: Option<String>) -> String {
    if let Some(url) = cli_url {
        return url;
    }

    let config_dir = config::get_config_dir_path();
    if let Some(ref dir) = config_dir {
        if let Ok(update) = config::config_from_file(Some(dir.join("config.toml"))) {
            if let Some(url) = update.database_url {
                return url;
            }
        }
    }

    config::base_config(config_dir).database_url
}

fn main() {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let output_config = OutputConfig {
        format: cli.format,
        quiet: cli.quiet,
    };

    let database_url = resolve_database_url(cli.database_url);
    let pool = match db::init_pool(&database_url) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error: could not open database {}: {}", database_url, e);
            process::exit(1);
        }
    };
    let migrated = pool
        .get()
        .map_err(anyhow::Error::from)
        .and_then(|mut conn| run_migrations(&mut conn));
    if let Err(e) = migrated {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }

    let result = match cli.command {
        Commands::CreateSuperAdmin { name, email, password } => {
            commands::create_super_admin(&pool, name, &email, &password, &output_config)
        }
        Commands::Seed { password } => commands::seed(&pool, &password, &output_config),
        Commands::ReconcileStock => commands::reconcile_stock(&pool, &output_config),
        Commands::PurgeRateLimits { window_secs } => {
            commands::purge_rate_limits(pool, window_secs, &output_config)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
