//! Standalone checker for the relay bot configuration.
//!
//! Loads the same `.env` file and environment as the bot, reports every
//! invalid setting, and checks that the admin and keyword files parse.

use std::process::ExitCode;

use clap::Parser;

use keyword_relay_bot::auth::{ListFile, UNCONFIGURED_ADMIN};
use keyword_relay_bot::config::Settings;
use keyword_relay_bot::relay::{compile_keyword, has_word_edges};

/// Relay bot configuration checker.
#[derive(Parser, Debug)]
#[command(name = "check_config")]
#[command(about = "Validates the environment and state files of the keyword relay bot")]
#[command(version)]
struct Args {
    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Show every loaded setting and list entry.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    match dotenvy::from_filename(&args.env_file) {
        Ok(_) => println!("Loaded environment from: {}", args.env_file),
        Err(e) => println!("No .env file loaded ({}): {e}", args.env_file),
    }

    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            println!();
            for issue in e.issues() {
                println!("  ✗ {issue}");
            }
            println!("\n✗ Configuration invalid: {} problem(s)", e.issues().len());
            return ExitCode::FAILURE;
        }
    };

    println!("✓ Required settings present");
    if args.verbose {
        println!("  Telegram:        {:?}", settings.telegram);
        println!("  Target channel:  {}", settings.relay.target_channel);
        println!("  Broadcast delay: {:?}", settings.relay.broadcast_delay);
        println!("  Heartbeat:       {:?}", settings.relay.heartbeat_interval);
    }
    if !settings.relay.target_channel.is_channel_style() {
        println!(
            "  ⚠ Target channel {} has no -100 marker and is used as-is",
            settings.relay.target_channel
        );
    }

    let mut errors = 0;
    errors += check_admins(&settings, args.verbose);
    errors += check_keywords(&settings, args.verbose);

    println!();
    if errors == 0 {
        println!("✓ Configuration is valid!");
        ExitCode::SUCCESS
    } else {
        println!("✗ Validation failed: {errors} error(s)");
        ExitCode::FAILURE
    }
}

fn check_admins(settings: &Settings, verbose: bool) -> usize {
    let access = &settings.access;
    let file = ListFile::<i64>::new(&access.admins_path);

    let admins = match file.load() {
        Ok(Some(admins)) => {
            println!("✓ {}: {} admin(s)", file.path().display(), admins.len());
            admins
        }
        Ok(None) => {
            println!(
                "  {} not found; it will be seeded from the environment",
                file.path().display()
            );
            access.admin_ids.clone()
        }
        Err(e) => {
            println!("  ✗ {e}");
            return 1;
        }
    };

    if verbose {
        for id in &admins {
            let mark = if *id == access.owner_id { " (owner)" } else { "" };
            println!("    {id}{mark}");
        }
    }

    if admins.iter().all(|&id| id == UNCONFIGURED_ADMIN) {
        println!("  ⚠ No admins configured: any user will be accepted as a provisional admin");
    }
    if access.owner_id == 0 {
        println!("  ⚠ OWNER_ID not set: the first admin to run an owner command becomes the owner");
    }

    0
}

fn check_keywords(settings: &Settings, verbose: bool) -> usize {
    let file = ListFile::<String>::new(&settings.access.keywords_path);
    let path = file.path();

    let keywords = match file.load() {
        Ok(Some(keywords)) => keywords,
        Ok(None) => {
            println!("  {} not found; default keywords will be seeded", path.display());
            return 0;
        }
        Err(e) => {
            println!("  ✗ {e}");
            return 1;
        }
    };

    let mut errors = 0;
    for keyword in &keywords {
        match compile_keyword(keyword) {
            Ok(_) if keyword.is_empty() => {
                errors += 1;
                println!("  ✗ Empty keyword");
            }
            Ok(_) => {
                if !has_word_edges(keyword) {
                    println!("  ⚠ Keyword '{keyword}' only matches next to a letter or digit");
                }
                if verbose {
                    println!("    {keyword}");
                }
            }
            Err(e) => {
                errors += 1;
                println!("  ✗ Keyword '{keyword}' is invalid: {e}");
            }
        }
    }

    if errors == 0 {
        println!("✓ {}: {} keyword(s)", path.display(), keywords.len());
    }
    errors
}
