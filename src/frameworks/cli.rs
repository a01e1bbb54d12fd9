use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::{ApiError, Navigator, ShippingDetails, UploadContact};
use crate::frameworks::app::build_state;
use crate::frameworks::config::Config;
use crate::interface_adapters::state::AppState;
use crate::use_cases::account::AccountError;
use crate::use_cases::auth_state::{AuthStatus, resolve_auth_status};
use crate::use_cases::checkout::{CheckoutAttempt, wait_for_payment};
use crate::use_cases::custom_files::{UploadError, UploadFile};

#[derive(Parser)]
#[command(name = "storefront")]
#[command(about = "Storefront client: account, catalog, checkout and custom uploads")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in and keep the session token locally.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in with it.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token.
    Logout,
    /// Show who the stored session belongs to.
    Whoami,
    Products {
        #[arg(long)]
        category: Option<String>,
    },
    Product {
        id: String,
    },
    Cart,
    /// Create an order and start payment.
    Checkout(CheckoutArgs),
    PaymentStatus {
        order_id: String,
    },
    /// Send design files for a custom order.
    Upload(UploadArgs),
}

#[derive(Args)]
pub struct CheckoutArgs {
    #[arg(long)]
    pub full_name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub address: String,
    #[arg(long)]
    pub city: String,
    #[arg(long)]
    pub postal_code: String,
    #[arg(long)]
    pub country: String,
    /// Reuse the key printed by an earlier attempt to retry without a duplicate order.
    #[arg(long)]
    pub idempotency_key: Option<String>,
    /// Poll the payment status until it settles.
    #[arg(long, default_value_t = false)]
    pub wait: bool,
}

#[derive(Args)]
pub struct UploadArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub message: Option<String>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Account(#[from] AccountError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error("could not open {path}: {source}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not render output: {0}")]
    Output(#[from] serde_json::Error),
}

// The terminal cannot navigate, so redirects become instructions on stderr.
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, destination: &str) {
        tracing::debug!(%destination, "redirect");
        eprintln!("open: {destination}");
    }
}

// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run() -> ExitCode {
    // Load .env locally; safe to ignore when not present.
    let _ = dotenvy::dotenv();
    init_tracing();
    let cli = Cli::parse();

    let config = match Config::load() {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid configuration");
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let state = match build_state(&config, Arc::new(TerminalNavigator)) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!(%error, "failed to build http client");
            eprintln!("error: {error}");
            return ExitCode::FAILURE;
        }
    };

    match execute(cli.command, &state, &config).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::FAILURE
        }
    }
}

// Run one subcommand and render its result as pretty JSON.
pub async fn execute(command: Command, state: &AppState, config: &Config) -> Result<String, CliError> {
    let value = match command {
        Command::Login { email, password } => {
            let auth = state.account().login(&email, &password).await?;
            json!({ "signedIn": true, "user": auth.user })
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let auth = state.account().register(&name, &email, &password).await?;
            json!({ "signedIn": true, "user": auth.user })
        }
        Command::Logout => {
            state.account().logout()?;
            json!({ "signedIn": false })
        }
        Command::Whoami => match resolve_auth_status(&state.session, &state.account()).await {
            AuthStatus::SignedIn(profile) => json!({ "signedIn": true, "user": profile }),
            AuthStatus::SignedOut => json!({ "signedIn": false }),
            AuthStatus::Unavailable(message) => {
                json!({ "signedIn": null, "error": message })
            }
        },
        Command::Products { category } => {
            serde_json::to_value(state.catalog().list_products(category.as_deref()).await?)?
        }
        Command::Product { id } => serde_json::to_value(state.catalog().product(&id).await?)?,
        Command::Cart => serde_json::to_value(state.catalog().cart().await?)?,
        Command::Checkout(args) => checkout(args, state, config).await?,
        Command::PaymentStatus { order_id } => {
            let status = state.checkout().payment_status(&order_id).await?;
            json!({ "orderId": order_id, "status": status })
        }
        Command::Upload(args) => upload(args, state).await?,
    };

    Ok(serde_json::to_string_pretty(&value)?)
}

async fn checkout(args: CheckoutArgs, state: &AppState, config: &Config) -> Result<Value, CliError> {
    let attempt = args
        .idempotency_key
        .map(CheckoutAttempt::resume)
        .unwrap_or_else(CheckoutAttempt::start);
    // Printed first so a failed attempt can be retried with the same key.
    eprintln!("checkout attempt: {}", attempt.idempotency_key());

    let shipping = ShippingDetails {
        full_name: args.full_name,
        email: args.email,
        phone: args.phone,
        address: args.address,
        city: args.city,
        postal_code: args.postal_code,
        country: args.country,
    };

    let checkout = state.checkout();
    let order = checkout.place_order(&attempt, &shipping).await?;
    let redirect = checkout.begin_payment(&order.order_id).await?;

    let status = if args.wait {
        let status = wait_for_payment(
            &checkout,
            &order.order_id,
            config.payment_poll_interval,
            config.payment_poll_attempts,
        )
        .await?;
        Some(status)
    } else {
        None
    };

    Ok(json!({
        "order": order,
        "paymentUrl": redirect.payment_url,
        "paymentStatus": status,
    }))
}

async fn upload(args: UploadArgs, state: &AppState) -> Result<Value, CliError> {
    let mut files = Vec::with_capacity(args.files.len());
    for path in args.files {
        let file = UploadFile::from_path(&path)
            .await
            .map_err(|source| CliError::File { path, source })?;
        files.push(file);
    }

    let contact = UploadContact {
        name: args.name,
        email: args.email,
        phone: args.phone,
        message: args.message,
    };

    Ok(state.custom_files().upload(files, &contact).await?)
}
