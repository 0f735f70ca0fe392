//! Command-line interface for the wallet-card pass builder.
//!
//! Generates Apple Wallet business-card passes from YAML/JSON configuration,
//! validates configuration files, and writes companion QR images.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wallet_card::assets::{vcard, write_qr, VCard, DEFAULT_QR_NAME, DEFAULT_QR_SIZE};
use wallet_card::config::templates::{DEFAULT_TEMPLATE, TEMPLATES};
use wallet_card::config::{default_config, load_config, load_config_over, save_config, ConfigFormat};
use wallet_card::{Error, PassBuilder, QrLevel, Template};

/// Config files tried, in order, when `generate` gets no `--config`.
const CONFIG_CANDIDATES: [&str; 4] = ["config.yaml", "config.yml", "config.json", "config/example.yaml"];

/// Apple Wallet digital business card generator
#[derive(Parser)]
#[command(name = "wallet-card")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "wallet_card=trace"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a pass from configuration
    Generate {
        /// Configuration file (YAML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output filename (default: derived from the pass description)
        #[arg(short, long)]
        output: Option<String>,

        /// Style preset
        #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
        template: String,

        /// Certificate file for signing (PEM or DER)
        #[arg(long)]
        cert: Option<PathBuf>,

        /// Private key file for signing
        #[arg(long)]
        key: Option<PathBuf>,

        /// PKCS#12 file for signing (.p12)
        #[arg(long, conflicts_with_all = ["cert", "key"])]
        p12: Option<PathBuf>,

        /// Password for the private key or PKCS#12 file
        #[arg(long)]
        password: Option<String>,

        /// Directory for prepared images
        #[arg(long, default_value = wallet_card::builder::DEFAULT_ASSETS_DIR)]
        assets_dir: PathBuf,

        /// Directory for generated passes
        #[arg(long, default_value = wallet_card::builder::DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Fail instead of producing an unsigned pass
        #[arg(long)]
        require_signature: bool,

        /// ZIP compression level (0-9)
        #[arg(short = 'z', long, default_value = "6")]
        zip_level: u32,
    },
    /// Validate a configuration file
    Validate {
        /// Configuration file (YAML or JSON)
        config_file: PathBuf,
    },
    /// List available style presets
    ListTemplates,
    /// Write a configuration file with the default values
    InitConfig {
        /// Output configuration file path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,

        /// Configuration file format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: FormatArg,
    },
    /// Write a QR image for a URL, or for a contact card when --name is given
    Qr {
        /// Text to encode (e.g. the URL where the pass is hosted)
        data: Option<String>,

        /// Output image path
        #[arg(short, long, default_value = DEFAULT_QR_NAME)]
        output: PathBuf,

        /// Side length in pixels
        #[arg(long, default_value_t = DEFAULT_QR_SIZE)]
        size: u32,

        /// Contact name; switches to a vCard payload
        #[arg(long)]
        name: Option<String>,

        #[arg(long, default_value = "")]
        title: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        website: String,

        #[arg(long, default_value = "")]
        linkedin: String,

        #[arg(long, default_value = "")]
        github: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for ConfigFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Yaml => ConfigFormat::Yaml,
            FormatArg::Json => ConfigFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let result = match cli.command {
        Commands::Generate {
            config,
            output,
            template,
            cert,
            key,
            p12,
            password,
            assets_dir,
            output_dir,
            require_signature,
            zip_level,
        } => {
            let mut builder = PassBuilder::new()
                .assets_dir(assets_dir)
                .output_dir(output_dir)
                .compression_level(zip_level)
                .allow_unsigned(!require_signature);
            if let Some(cert) = cert {
                builder = builder.certificate(cert);
            }
            if let Some(key) = key {
                builder = builder.private_key(key);
            }
            if let Some(p12) = p12 {
                builder = builder.pkcs12(p12);
            }
            if let Some(password) = password {
                builder = builder.password(password);
            }
            handle_generate(&builder, config.as_deref(), output.as_deref(), &template)
        }
        Commands::Validate { config_file } => handle_validate(&config_file),
        Commands::ListTemplates => {
            handle_list_templates();
            Ok(true)
        }
        Commands::InitConfig { output, format } => handle_init_config(&output, format.into()),
        Commands::Qr {
            data,
            output,
            size,
            name,
            title,
            email,
            phone,
            website,
            linkedin,
            github,
        } => {
            let payload = match name {
                Some(name) => QrPayload::Contact(VCard {
                    name,
                    title,
                    email,
                    phone,
                    website,
                    linkedin,
                    github,
                }),
                None => match data {
                    Some(data) => QrPayload::Text(data),
                    None => {
                        eprintln!("Error: provide the text to encode or --name for a contact card");
                        return ExitCode::FAILURE;
                    }
                },
            };
            handle_qr(payload, &output, size)
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr subscriber. `--log-level` wins over `RUST_LOG`; default is `info`.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info")),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn find_config() -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
}

fn print_errors(header: &str, errors: &[String]) {
    eprintln!("{header}");
    for error in errors {
        eprintln!("  - {error}");
    }
}

fn handle_generate(
    builder: &PassBuilder,
    config_path: Option<&Path>,
    output: Option<&str>,
    template: &str,
) -> anyhow::Result<bool> {
    let template = Template::get(template)?;

    let config_path = match config_path {
        Some(path) => {
            anyhow::ensure!(path.exists(), "Configuration file not found: {}", path.display());
            Some(path.to_path_buf())
        }
        None => {
            let found = find_config();
            match &found {
                Some(path) => println!("Using configuration: {}", path.display()),
                None => {
                    eprintln!("No configuration file found. Using defaults.");
                    println!("Run 'wallet-card init-config' to create a configuration file.");
                }
            }
            found
        }
    };

    let config = load_config_over(template.base_config(), config_path.as_deref(), std::env::vars())
        .context("Failed to load configuration")?;

    println!("Generating wallet card...");
    match builder.generate(&config, output) {
        Ok(outcome) => {
            println!("✅ Pass created: {}", outcome.path.display());
            if !outcome.signed {
                println!("   The pass is unsigned; Wallet only installs passes signed with a Pass Type ID certificate.");
            }
            println!("   Share this file via AirDrop, email, or host it on a website.");
            Ok(true)
        }
        Err(Error::Validation(errors)) => {
            print_errors("Configuration errors:", &errors);
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_validate(config_file: &Path) -> anyhow::Result<bool> {
    anyhow::ensure!(config_file.exists(), "Configuration file not found: {}", config_file.display());
    let config = load_config(Some(config_file), std::env::vars())?;
    let errors = wallet_card::validate_config(&config);

    if errors.is_empty() {
        println!("✅ Configuration is valid!");
        Ok(true)
    } else {
        print_errors("❌ Configuration is invalid:", &errors);
        Ok(false)
    }
}

fn handle_list_templates() {
    println!("Available templates:");
    for template in TEMPLATES {
        println!("  {:20} - {}", template.name, template.title);
    }
}

fn handle_init_config(output: &Path, format: ConfigFormat) -> anyhow::Result<bool> {
    save_config(&default_config(), output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("✅ Configuration file created: {}", output.display());
    println!("   Edit this file and run 'wallet-card generate -c {}'", output.display());
    Ok(true)
}

enum QrPayload {
    Text(String),
    Contact(VCard),
}

fn handle_qr(payload: QrPayload, output: &Path, size: u32) -> anyhow::Result<bool> {
    let (data, level) = match payload {
        QrPayload::Text(text) => (text, QrLevel::L),
        QrPayload::Contact(card) => (vcard(&card), QrLevel::M),
    };

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_qr(&data, output, size, level)?;

    println!("✅ QR code created: {}", output.display());
    Ok(true)
}
