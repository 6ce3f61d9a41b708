// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Tongue Tracker: tongue image analysis with local per-profile history

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use tongue_tracker::assessment::Assessment;
use tongue_tracker::client::{AnalysisClient, AnalysisService};
use tongue_tracker::config::AppConfig;
use tongue_tracker::db::Database;
use tongue_tracker::history::{project_all, timeline, trend_series};
use tongue_tracker::models::{now_timestamp, AnalysisRecord, Profile, GENDER_OPTIONS};
use tongue_tracker::repository::ProfileRepository;
use tongue_tracker::workflow::{analyze_and_record, download_artifacts};
use tongue_tracker::{Result, TrackerError};

/// Tongue Tracker CLI - analyze tongue images and track results per profile
#[derive(Parser, Debug)]
#[command(name = "tongue-tracker")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version)]
#[command(about = "Tongue image analysis with local per-profile history", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Identity of a stored profile
#[derive(Args, Debug, Clone)]
struct IdentityArgs {
    /// Profile name
    #[arg(short, long)]
    name: String,

    /// Age in years
    #[arg(short, long)]
    age: String,

    /// Gender (Male, Female, Other, Prefer not to say)
    #[arg(short, long)]
    gender: String,
}

impl IdentityArgs {
    fn profile(&self) -> Profile {
        Profile::new(self.name.clone(), self.age.clone(), self.gender.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Profile management
    Profile {
        #[command(subcommand)]
        action: ProfileCommands,
    },

    /// Send an image to the analysis server and record the result
    Analyze {
        /// Image file to analyze
        image: PathBuf,

        #[command(flatten)]
        who: IdentityArgs,

        /// Directory to save the generated visualization images into
        #[arg(long)]
        download: Option<PathBuf>,
    },

    /// Record a previously saved analysis payload (JSON)
    Import {
        /// File holding the server response
        payload: PathBuf,

        #[command(flatten)]
        who: IdentityArgs,

        /// History key to use (yyyy-MM-dd HH:mm:ss); defaults to now
        #[arg(long)]
        timestamp: Option<String>,
    },

    /// Show analyses of all profiles, newest first
    History {
        /// Maximum number of entries to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show one profile's history and trends
    Track {
        #[command(flatten)]
        who: IdentityArgs,
    },

    /// Ask the analysis server's assistant a question
    Chat {
        /// Message to send
        message: String,
    },

    /// Show analysis server and database status
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ProfileCommands {
    /// Create a profile (existing history is kept)
    Add {
        #[command(flatten)]
        who: IdentityArgs,
    },

    /// List all profiles
    List,

    /// Delete a profile and its history
    Delete {
        #[command(flatten)]
        who: IdentityArgs,

        /// Skip confirmation
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Profile { action } => run_profile_command(&config, action, json),
        Commands::Analyze { image, who, download } => {
            run_analyze(&config, &image, &who, download.as_deref(), json).await
        }
        Commands::Import { payload, who, timestamp } => {
            run_import(&config, &payload, &who, timestamp, json)
        }
        Commands::History { limit } => run_history(&config, limit, json),
        Commands::Track { who } => run_track(&config, &who, json),
        Commands::Chat { message } => run_chat(&config, &message, json).await,
        Commands::Status => run_status(&config).await,
        Commands::Config { action } => run_config_command(&config, action),
    }
}

fn open_repository(config: &AppConfig) -> Result<ProfileRepository<Database>> {
    let db = Database::open(&config.database.path)?;
    info!("Database: {}", config.database.path);
    ProfileRepository::new(db)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_assessment(assessment: &Assessment) {
    println!("Conditions:");
    for condition in &assessment.conditions {
        println!(
            "  {:<14} {:<9} {:<8} {}",
            condition.name, condition.severity, condition.status, condition.description
        );
    }
    println!("\nRecommendations:");
    for (i, line) in assessment.recommendations.iter().enumerate() {
        println!("  {}. {}", i + 1, line);
    }
}

/// Run profile commands
fn run_profile_command(config: &AppConfig, action: ProfileCommands, json: bool) -> Result<()> {
    let repo = open_repository(config)?;

    match action {
        ProfileCommands::Add { who } => {
            if !GENDER_OPTIONS.contains(&who.gender.as_str()) {
                warn!("Gender '{}' is not one of {:?}", who.gender, GENDER_OPTIONS);
            }
            repo.save_profile(&who.profile())?;
            println!("Saved profile {}", who.profile().key());
        }
        ProfileCommands::List => {
            let profiles = repo.all_profiles()?;
            if json {
                return print_json(&profiles);
            }
            println!("Profiles ({}):", profiles.len());
            for profile in profiles {
                println!(
                    "  {} - {} years, {} ({} analyses)",
                    profile.name,
                    profile.age,
                    profile.gender,
                    profile.history.len()
                );
            }
        }
        ProfileCommands::Delete { who, force } => {
            if !force {
                eprintln!("Use --force to confirm deleting {} and its history", who.profile().key());
                return Ok(());
            }
            if repo.delete_profile(&who.profile())? {
                println!("Deleted profile {}", who.profile().key());
            } else {
                println!("No profile {}", who.profile().key());
            }
        }
    }

    Ok(())
}

/// Analyze an image and record it
async fn run_analyze(
    config: &AppConfig,
    image: &Path,
    who: &IdentityArgs,
    download: Option<&Path>,
    json: bool,
) -> Result<()> {
    let repo = open_repository(config)?;
    let client = AnalysisClient::from_config(&config.api)?;
    let profile = who.profile();

    let recorded = analyze_and_record(&client, &repo, &profile, image).await?;

    let downloaded = match download {
        Some(dir) => download_artifacts(&client, &recorded.record, dir).await?,
        None => Vec::new(),
    };

    if json {
        return print_json(&serde_json::json!({
            "timestamp": recorded.timestamp,
            "analysis": recorded.record,
            "assessment": recorded.assessment,
            "downloaded": downloaded,
        }));
    }

    println!("Recorded analysis for {} at {}", profile.key(), recorded.timestamp);
    if let Some(summary) = recorded.record.summary.as_deref() {
        println!("\nSummary: {}", summary);
    }
    println!();
    print_assessment(&recorded.assessment);
    for path in downloaded {
        println!("Saved {}", path.display());
    }

    Ok(())
}

/// Record a saved server response
fn run_import(
    config: &AppConfig,
    payload: &Path,
    who: &IdentityArgs,
    timestamp: Option<String>,
    json: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(payload)?;
    let record: AnalysisRecord = serde_json::from_str(&content)?;
    let repo = open_repository(config)?;

    let timestamp = timestamp.unwrap_or_else(now_timestamp);
    repo.add_analysis(&who.profile(), &timestamp, record.clone())?;

    let assessment = Assessment::of(&record);
    if json {
        return print_json(&serde_json::json!({
            "timestamp": timestamp,
            "assessment": assessment,
        }));
    }

    println!("Imported {:?} for {} at {}", payload, who.profile().key(), timestamp);
    print_assessment(&assessment);
    Ok(())
}

/// Show projected history across all profiles
fn run_history(config: &AppConfig, limit: Option<usize>, json: bool) -> Result<()> {
    let repo = open_repository(config)?;
    let mut items = project_all(&repo.all_profiles()?);
    if let Some(limit) = limit {
        items.truncate(limit);
    }

    if json {
        return print_json(&items);
    }

    if items.is_empty() {
        println!("No analyses recorded yet");
        return Ok(());
    }

    println!("Analysis history ({} entries):", items.len());
    for item in items {
        let coating = item
            .analysis
            .white_coating
            .as_ref()
            .and_then(|c| c.white_coating_percentage)
            .unwrap_or(0.0);
        println!(
            "  {}  {:<16} coating {:>5.1}%  {}",
            item.timestamp,
            item.profile,
            coating,
            item.analysis.summary.as_deref().unwrap_or("-")
        );
    }

    Ok(())
}

/// Show one profile's timeline and trend series
fn run_track(config: &AppConfig, who: &IdentityArgs, json: bool) -> Result<()> {
    let repo = open_repository(config)?;
    let Some(profile) = repo.find(&who.name, &who.age, &who.gender)? else {
        println!("No profile {}", who.profile().key());
        return Ok(());
    };

    let series = trend_series(&profile.history);
    if json {
        return print_json(&serde_json::json!({
            "profile": profile.key().to_string(),
            "trend": series,
        }));
    }

    println!("{}'s analysis history ({} analyses)", profile.name, profile.history.len());
    for (timestamp, analysis) in timeline(&profile) {
        let assessment = Assessment::of(analysis);
        let worst = assessment
            .conditions
            .iter()
            .max_by_key(|c| c.severity)
            .map(|c| format!("{} {}", c.name, c.severity))
            .unwrap_or_default();
        println!("  {}  worst: {}", timestamp, worst);
    }

    if !series.dates.is_empty() {
        println!("\nTrends (oldest first):");
        println!("  {:<6} {:>9} {:>7} {:>8} {:>8}", "date", "nutrition", "mantle", "redness", "coating");
        for i in 0..series.dates.len() {
            println!(
                "  {:<6} {:>9.1} {:>7.1} {:>8.1} {:>8.1}",
                series.short_dates[i],
                series.nutrition_scores[i],
                series.mantle_scores[i],
                series.redness_values[i],
                series.coating_percentages[i]
            );
        }
    }

    Ok(())
}

/// Send one chat message and print the reply
async fn run_chat(config: &AppConfig, message: &str, json: bool) -> Result<()> {
    let client = AnalysisClient::from_config(&config.api)?;
    let reply = client.send_chat(message).await?;
    info!("Chat reply received from {}", client.base_url());

    if json {
        print_json(&serde_json::json!({ "message": message, "reply": reply }))?;
    } else {
        println!("{}", reply);
    }
    Ok(())
}

/// Run status check
async fn run_status(config: &AppConfig) -> Result<()> {
    println!("Tongue Tracker v{} Status", env!("CARGO_PKG_VERSION"));
    println!("==========================");

    let client = AnalysisClient::from_config(&config.api)?;
    match client.health_check().await {
        Ok(health) => {
            println!("Analysis server ({}): {}", client.base_url(), health.status);
            println!("  SAM model: {}", health.sam_model);
            println!("  Roboflow client: {}", health.roboflow_client);
        }
        Err(e) => println!("Analysis server ({}): Error - {}", client.base_url(), e),
    }

    match Database::open(&config.database.path) {
        Ok(db) => {
            println!("\nDatabase ({}):", config.database.path);
            println!("  Profiles: {}", db.profile_count()?);
        }
        Err(e) => println!("\nDatabase: Error - {}", e),
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: &AppConfig, action: ConfigCommands) -> Result<()> {
    match action {
        ConfigCommands::Show => print_json(config)?,
        ConfigCommands::Generate { output } => {
            if output.exists() {
                return Err(TrackerError::Config(format!(
                    "{:?} already exists",
                    output
                )));
            }
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["tongue-tracker"]).is_err());
    }

    #[test]
    fn test_cli_analyze_command() {
        let cli = Cli::try_parse_from([
            "tongue-tracker", "analyze", "/tmp/tongue.jpg",
            "--name", "Alice", "--age", "30", "--gender", "Female",
            "--download", "/tmp/out",
        ]).unwrap();

        match cli.command {
            Commands::Analyze { image, who, download } => {
                assert_eq!(image, PathBuf::from("/tmp/tongue.jpg"));
                assert_eq!(who.name, "Alice");
                assert_eq!(who.gender, "Female");
                assert_eq!(download, Some(PathBuf::from("/tmp/out")));
            }
            _ => panic!("Expected Analyze command"),
        }
    }

    #[test]
    fn test_cli_profile_add_short_flags() {
        let cli = Cli::try_parse_from([
            "tongue-tracker", "profile", "add", "-n", "Bob", "-a", "41", "-g", "Prefer not to say",
        ]).unwrap();

        match cli.command {
            Commands::Profile { action: ProfileCommands::Add { who } } => {
                assert_eq!(who.profile(), Profile::new("Bob", "41", "Prefer not to say"));
            }
            _ => panic!("Expected Profile Add command"),
        }
    }

    #[test]
    fn test_cli_history_json() {
        let cli = Cli::try_parse_from([
            "tongue-tracker", "history", "--limit", "5", "--format", "json",
        ]).unwrap();
        assert_eq!(cli.format, "json");
        assert!(matches!(cli.command, Commands::History { limit: Some(5) }));
    }

    #[test]
    fn test_cli_chat_command() {
        let cli = Cli::try_parse_from(["tongue-tracker", "chat", "What does a thick coating mean?"]).unwrap();
        match cli.command {
            Commands::Chat { message } => assert_eq!(message, "What does a thick coating mean?"),
            _ => panic!("Expected Chat command"),
        }
        assert!(Cli::try_parse_from(["tongue-tracker", "chat"]).is_err());
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["tongue-tracker", "history", "--format", "xml"]).is_err());
    }
}
