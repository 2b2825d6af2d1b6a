//! lzpay
//!
//! Creates Lolz Market balance deposits and checks their status from the
//! command line, using the cookies of a logged-in browser.

mod config;
mod wait;

use clap::{Parser, Subcommand};
use config::{ConfigLoader, Overrides};
use lzpay_sdk::client::PaymentClient;
use lzpay_sdk::{PaymentInfo, PaymentMethod, PaymentResponse, SessionCookies};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;
use wait::{WaitOutcome, wait_for_payment};

/// lzpay - Lolz Market balance deposits from the command line
#[derive(Parser, Debug)]
#[command(name = "lzpay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file [default: ./lzpay.toml if present]
    #[arg(short, long, env = "LZPAY_CONFIG")]
    config: Option<PathBuf>,

    /// Path to the browser cookie export (JSON)
    #[arg(long, env = "LZPAY_COOKIES")]
    cookies: Option<PathBuf>,

    /// Override the marketplace URL (e.g. https://lzt.market)
    #[arg(long)]
    base_url: Option<Url>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new deposit
    Create {
        /// Amount in roubles
        amount: Decimal,

        /// Payment method: card, sbp, binance or steam
        #[arg(short, long, default_value = "card")]
        method: PaymentMethod,

        /// Phone number, used by sbp
        #[arg(short, long)]
        phone: Option<String>,
    },
    /// Show the status of a deposit
    Check {
        /// Payment id returned by `create`
        id: String,
    },
    /// Poll a deposit until it is paid or the timeout runs out
    Wait {
        /// Payment id returned by `create`
        id: String,

        /// Seconds between two checks
        #[arg(long)]
        interval: Option<u64>,

        /// Seconds after which to give up
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    let (wait_interval_secs, wait_timeout_secs) = match &args.command {
        Command::Wait {
            interval, timeout, ..
        } => (*interval, *timeout),
        _ => (None, None),
    };
    let overrides = Overrides {
        cookies: args.cookies,
        base_url: args.base_url,
        wait_interval_secs,
        wait_timeout_secs,
    };

    // Load configuration
    let loaded = ConfigLoader::new(args.config, overrides)
        .load()
        .map_err(|e| {
            tracing::error!("Failed to load configuration: {}", e);
            e
        })?;

    let cookies = SessionCookies::load(&loaded.cookies_path);
    let client = PaymentClient::new(cookies, loaded.client);

    let code = match args.command {
        Command::Create {
            amount,
            method,
            phone,
        } => create(&client, amount, method, phone).await,
        Command::Check { id } => check(&client, &id).await,
        Command::Wait { id, .. } => {
            println!("Waiting for payment {id}...");
            match wait_for_payment(&client, &id, loaded.wait).await {
                WaitOutcome::Paid(_) => {
                    println!("Payment {id} is paid!");
                    ExitCode::SUCCESS
                }
                WaitOutcome::TimedOut { .. } => {
                    println!("Payment {id} was not paid in time");
                    ExitCode::FAILURE
                }
            }
        }
    };
    Ok(code)
}

async fn create(
    client: &PaymentClient,
    amount: Decimal,
    method: PaymentMethod,
    phone: Option<String>,
) -> ExitCode {
    match client.create_payment(amount, method, phone).await {
        PaymentResponse::Success {
            final_url,
            payment_id,
        } => {
            println!("Payment created!");
            println!("Payment ID: {payment_id}");
            println!("Payment URL: {final_url}");
            ExitCode::SUCCESS
        }
        PaymentResponse::Failure { message } => {
            println!("Failed to create payment: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn check(client: &PaymentClient, id: &str) -> ExitCode {
    let Some(payment) = client.check_payment(id).await else {
        println!("Could not get information about payment {id}");
        return ExitCode::FAILURE;
    };
    print_payment(&payment);
    ExitCode::SUCCESS
}

fn print_payment(payment: &PaymentInfo) {
    println!("Payment {}:", payment.payment_id);
    println!("Created: {}", payment.creation_date);
    println!("Payment status: {}", payment.payment_date);
    println!("Amount: {}", payment.amount);
    println!("Type: {}", payment.payment_type);
    println!("Paid: {}", if payment.is_paid() { "yes" } else { "no" });
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
