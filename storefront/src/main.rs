//! storefront - drive the client core from the command line
//!
//! Every command dispatches through the store, waits for the effects it
//! started to settle, and prints the slice it touched as JSON.
//!
//! ```sh
//! storefront --api-url http://localhost:3000 home
//! storefront login ayse@example.com secret
//! storefront whoami
//! storefront favorite '{"id":7,"name":"Camera","image":"c.jpg","rating":4.5,"price":120}'
//! ```
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `storefront=info`).

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use state_dispatch::FileStore;
use tracing_subscriber::EnvFilter;

use storefront::{Config, HttpApi, Product, Storefront};

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Headless storefront client: catalog, favorites and session")]
struct Args {
    /// Backend base URL (overrides config)
    #[arg(long)]
    api_url: Option<String>,

    /// Directory for persisted state (overrides config)
    #[arg(long)]
    storage: Option<PathBuf>,

    /// Request timeout in seconds (overrides config)
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch categories, recommended and best sellers
    Home,
    /// Fetch the products of one category
    Products { category_id: u64 },
    Login { email: String, password: String },
    Register {
        email: String,
        password: String,
        #[arg(long)]
        accept_terms: bool,
    },
    /// Submit the one-time code sent after registration
    Verify { email: String, otp: String },
    Logout,
    /// Show the current session
    Whoami,
    /// List favorites
    Favorites,
    /// Toggle a product (given as JSON) in favorites
    Favorite { product: String },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("storefront=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(url) = &args.api_url {
        config.api.base_url = url.clone();
    }
    if let Some(secs) = args.timeout {
        config.api.timeout_secs = secs;
    }
    if let Some(dir) = &args.storage {
        config.storage.dir = Some(dir.clone());
    }
    config.validate()?;
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn exit_for(error: bool) -> ExitCode {
    if error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn Error>> {
    let config = load_config(&args)?;
    let storage_dir = config.storage.resolved_dir();
    tracing::debug!(api = %config.api.base_url, storage = %storage_dir.display(), "Starting");

    let api = Arc::new(HttpApi::new(&config.api.base_url, config.api.timeout())?);
    let storage = Arc::new(FileStore::open(storage_dir)?);
    let mut app = Storefront::new(api, storage);

    let code = match args.command {
        Command::Home => {
            app.fetch_home();
            app.settle().await;
            let catalog = &app.state().catalog;
            print_json(catalog)?;
            exit_for(catalog.error.is_some())
        }
        Command::Products { category_id } => {
            app.fetch_category_products(category_id);
            app.settle().await;
            let products = &app.state().category_products;
            print_json(products)?;
            exit_for(products.error.is_some())
        }
        Command::Login { email, password } => {
            app.login(email, password);
            app.settle().await;
            print_session(&app)?
        }
        Command::Register {
            email,
            password,
            accept_terms,
        } => {
            app.register(email, password, accept_terms);
            app.settle().await;
            print_session(&app)?
        }
        Command::Verify { email, otp } => {
            app.verify_otp(email, otp);
            app.settle().await;
            print_session(&app)?
        }
        Command::Logout => {
            app.logout();
            app.settle().await;
            print_session(&app)?
        }
        Command::Whoami => print_session(&app)?,
        Command::Favorites => {
            print_json(&app.state().favorites)?;
            ExitCode::SUCCESS
        }
        Command::Favorite { product } => {
            let product: Product = serde_json::from_str(&product)?;
            let name = product.name.clone();
            let now_favorite = app.toggle_favorite(product);
            tracing::info!(product = %name, favorite = now_favorite, "Favorite toggled");
            app.settle().await;
            print_json(&app.state().favorites)?;
            ExitCode::SUCCESS
        }
    };
    Ok(code)
}

/// Session view without the raw token
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionView<'a> {
    phase: storefront::AuthPhase,
    authenticated: bool,
    user: Option<&'a storefront::UserRef>,
    token_source: Option<storefront::TokenSource>,
    pending_email: Option<&'a str>,
    error: Option<&'a storefront::ErrorInfo>,
}

fn print_session(app: &Storefront) -> Result<ExitCode, Box<dyn Error>> {
    let session = &app.state().session;
    if session.is_unverified_restore() {
        tracing::warn!("Session restored from storage and not revalidated");
    }
    print_json(&SessionView {
        phase: session.phase(),
        authenticated: session.is_authenticated(),
        user: session.user.as_ref(),
        token_source: session.token_source,
        pending_email: session.pending_email.as_deref(),
        error: session.error.as_ref(),
    })?;
    Ok(exit_for(session.error.is_some()))
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
