// src/main.rs

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use licensor::logging::init_logging;
use licensor::{
    License, LicenseError, LicenseLevel, LicenseManager, LicenseResult, LicensorConfig,
    ManagerConfig, SignatureScheme,
};

#[cfg(feature = "ed25519")]
use licensor::Ed25519Scheme;

const DEFAULT_LICENSE_FILE: &str = "license.dat";

/// Licensor - issue, verify and renew signed software licenses
#[derive(Parser, Debug)]
#[command(name = "licensor")]
#[command(about = "Issue, verify and renew signed software licenses", long_about = None)]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the key pair (overrides keys.dir)
    #[arg(short = 'c', long = "key-dir", global = true)]
    key_dir: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new key pair
    Keys,

    /// Issue a new license
    Generate {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Device ID the license is bound to
        #[arg(short, long = "device-id")]
        device_id: String,

        /// License level (defaults to license.default_level)
        #[arg(short, long, value_enum)]
        level: Option<CliLevel>,

        /// Validity in days (defaults to license.default_days)
        #[arg(short = 't', long)]
        days: Option<u32>,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_LICENSE_FILE)]
        output: PathBuf,
    },

    /// Verify a license for a device
    Verify {
        /// Device ID to check against
        #[arg(short, long = "device-id")]
        device_id: String,

        /// License file
        #[arg(short, long, default_value = DEFAULT_LICENSE_FILE)]
        file: PathBuf,
    },

    /// Show license details
    Info {
        /// License file
        #[arg(short, long, default_value = DEFAULT_LICENSE_FILE)]
        file: PathBuf,
    },

    /// Extend a license and re-sign it
    Renew {
        /// License file
        #[arg(short, long, default_value = DEFAULT_LICENSE_FILE)]
        file: PathBuf,

        /// Days to add (defaults to license.default_days)
        #[arg(short = 't', long)]
        days: Option<u32>,
    },
}

/// License level (CLI compatible)
#[derive(Clone, Copy, Debug, ValueEnum)]
enum CliLevel {
    Basic,
    Professional,
    Enterprise,
}

impl From<CliLevel> for LicenseLevel {
    fn from(level: CliLevel) -> Self {
        match level {
            CliLevel::Basic => LicenseLevel::Basic,
            CliLevel::Professional => LicenseLevel::Professional,
            CliLevel::Enterprise => LicenseLevel::Enterprise,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> LicenseResult<()> {
    let mut config = match &cli.config {
        Some(path) => LicensorConfig::load_from(path)?,
        None => LicensorConfig::load()?,
    };
    if let Some(dir) = cli.key_dir {
        config.keys.dir = dir;
    }
    if cli.verbose {
        config.logging.enabled = true;
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging)?;

    let manager_config = ManagerConfig::from(&config);
    match config.keys.scheme.as_str() {
        "rsa" => execute(LicenseManager::new(manager_config), &config, cli.command),
        #[cfg(feature = "ed25519")]
        "ed25519" => execute(
            LicenseManager::with_scheme(manager_config, Ed25519Scheme),
            &config,
            cli.command,
        ),
        other => Err(LicenseError::ConfigError(format!(
            "signature scheme '{other}' is not available in this build"
        ))),
    }
}

fn execute<S: SignatureScheme>(
    manager: LicenseManager<S>,
    config: &LicensorConfig,
    command: Commands,
) -> LicenseResult<()> {
    match command {
        Commands::Keys => {
            manager.generate_keys()?;
            println!("Key pair generated:");
            println!("  private key: {}", manager.config().private_key_path.display());
            println!("  public key:  {}", manager.config().public_key_path.display());
        }
        Commands::Generate {
            user,
            device_id,
            level,
            days,
            output,
        } => {
            let level = match level {
                Some(level) => level.into(),
                None => config.license.default_level()?,
            };
            let days = days.unwrap_or(config.license.default_days);

            let license = manager.generate_license(&user, &device_id, level, days)?;
            manager.save_license(&license, &output)?;
            println!("License issued: {}", output.display());
        }
        Commands::Verify { device_id, file } => {
            let license = manager.load_license(&file)?;
            manager.verify_license(&license, &device_id)?;

            println!("License is valid");
            let remaining = license.days_until_expiration();
            if remaining > 0 {
                println!("Days remaining: {remaining}");
            }
        }
        Commands::Info { file } => {
            let license = manager.load_license(&file)?;
            print_info(&license);
        }
        Commands::Renew { file, days } => {
            let days = days.unwrap_or(config.license.default_days);

            let mut license = manager.load_license(&file)?;
            manager.renew_license(&mut license, days)?;
            manager.save_license(&license, &file)?;

            println!("License renewed by {days} days");
            println!(
                "New expiry: {}",
                license.expires_at.format("%Y-%m-%d %H:%M:%S %:z")
            );
        }
    }
    Ok(())
}

fn print_info(license: &License) {
    println!("License:");
    println!("  ID:        {}", license.id);
    println!("  User:      {}", license.user_name);
    println!("  Device ID: {}", license.device_id);
    println!("  Level:     {}", license.level);
    println!("  Issued:    {}", license.issued_at.format("%Y-%m-%d %H:%M:%S %:z"));
    println!("  Expires:   {}", license.expires_at.format("%Y-%m-%d %H:%M:%S %:z"));
    if !license.features().is_empty() {
        println!("  Features:  {}", license.features().join(", "));
    }
    if license.is_expired() {
        println!("  Status:    expired");
    } else {
        println!(
            "  Status:    active ({} days remaining)",
            license.days_until_expiration()
        );
    }
}
