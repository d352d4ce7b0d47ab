use clap::ValueEnum;
use mobile_master::models::User;
use serde::Serialize;
use serde_json::json;

/// Output format for admin commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

/// Bundled output configuration passed to all print functions
#[derive(Debug, Clone, Copy)]
pub struct OutputConfig {
    /// The output format
    pub format: OutputFormat,
    /// When true, print minimal output (just IDs or counts)
    pub quiet: bool,
}

/// What `seed` created, for printing
#[derive(Debug, Serialize)]
pub struct SeedSummary {
    pub shop_id: String,
    pub owner_email: String,
    pub worker_email: String,
    pub products: usize,
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Error: could not encode output: {}", e),
    }
}

pub fn print_user(user: &User, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", user.id);
                return;
            }
            println!("ID:      {}", user.id);
            println!("Name:    {}", user.name);
            println!("Email:   {}", user.email);
            println!("Role:    {}", user.role);
            println!("Created: {}", user.created_at);
        }
        OutputFormat::Json => print_json(user),
    }
}

pub fn print_seed_summary(summary: &SeedSummary, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", summary.shop_id);
                return;
            }
            println!("Seeded demo shop {}", summary.shop_id);
            println!("  Owner:    {}", summary.owner_email);
            println!("  Worker:   {}", summary.worker_email);
            println!("  Products: {}", summary.products);
        }
        OutputFormat::Json => print_json(summary),
    }
}

/// Prints the result of a bulk maintenance task, e.g. "Purged 12 expired rate-limit hits"
pub fn print_count(verb: &str, count: usize, what: &str, config: &OutputConfig) {
    match config.format {
        OutputFormat::Human => {
            if config.quiet {
                println!("{}", count);
            } else {
                println!("{} {} {}", verb, count, what);
            }
        }
        OutputFormat::Json => print_json(&json!({ "count": count })),
    }
}
