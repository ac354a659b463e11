//! Storefront session client - command line entry point
//!
//! Loads configuration, wires the adapters into the auth client and runs one
//! session command against the configured identity provider and backend.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use storefront_application::{AuthClient, AuthInterceptor, ProfileService, SessionStateHolder};
use storefront_domain::{AppConfig, LoginRedirect, SessionState};
use storefront_infrastructure::{
    FileKeyValueStore, KeycloakProvider, ReqwestTransport, SystemClock, TokioFileSystem,
    default_storage_path, load_config,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

type Storage = FileKeyValueStore<TokioFileSystem>;
type Auth = AuthClient<KeycloakProvider, Storage, SystemClock>;

#[derive(Parser)]
#[command(name = "storefront", version, about = "Storefront session client")]
struct Args {
    #[arg(long, env = "STOREFRONT_CONFIG", help = "Config file path")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with username and password.
    Login {
        #[arg(short, long, env = "STOREFRONT_USERNAME")]
        username: String,
        #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, value_enum, help = "Print where to go after signing in")]
        redirect: Option<RedirectKind>,
    },
    /// Sign out and forget stored tokens.
    Logout,
    /// Show the signed-in user as reported by the identity provider.
    Whoami,
    /// Exchange the refresh token for a new access token.
    Refresh,
    /// Show a customer profile from the backend.
    Profile {
        id: String,
        #[arg(long, help = "Fall back to the demo profile on failure")]
        placeholder: bool,
    },
    /// Show the stored session and token status.
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum RedirectKind {
    /// The catalog front end, tokens in the query string.
    Catalog,
    /// The local home route.
    Home,
}

fn init_tracing(config: &AppConfig) {
    let default_level = if config.enable_debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn storage(config: &AppConfig) -> Result<Storage, Box<dyn std::error::Error>> {
    let path = default_storage_path(config.storage_dir.as_deref())
        .ok_or("no data directory available, set storage_dir")?;
    Ok(FileKeyValueStore::new(TokioFileSystem::new(), path))
}

fn print_session(state: &SessionState) {
    match &state.user {
        Some(user) if state.authenticated => {
            println!("Signed in as {} <{}>", user.greeting_name(), user.email);
        }
        _ => println!("Not signed in"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    init_tracing(&config);
    tracing::debug!(
        app = %config.app_name,
        version = %config.version,
        api_url = %config.api_url,
        realm = %config.keycloak.realm,
        "configuration loaded"
    );

    let provider = Arc::new(KeycloakProvider::new(&config.keycloak));
    let auth: Arc<Auth> = Arc::new(AuthClient::new(
        provider,
        storage(&config)?,
        Arc::new(SessionStateHolder::new()),
        SystemClock::new(),
    ));

    match args.command {
        Command::Login {
            username,
            password,
            redirect,
        } => {
            let state = auth.login(&username, &password).await?;
            print_session(&state);
            match redirect {
                Some(RedirectKind::Catalog) => {
                    println!("{}", LoginRedirect::external(&config.catalog_url, &state)?);
                }
                Some(RedirectKind::Home) => {
                    println!("{}", LoginRedirect::internal("/home", &state)?);
                }
                None => {}
            }
        }
        Command::Logout => {
            auth.logout().await;
            auth.wait_for_end_session().await;
            println!("Signed out");
        }
        Command::Whoami => {
            auth.restore_session().await;
            let info = auth.fetch_user_info().await?;
            println!("{} <{}>", info.greeting_name(), info.email);
            println!("subject: {}", info.subject_id);
        }
        Command::Refresh => {
            let tokens = auth.refresh().await?;
            println!("Access token valid until {}", tokens.expires_at());
        }
        Command::Profile { id, placeholder } => {
            auth.restore_session().await;
            let transport = AuthInterceptor::new(ReqwestTransport::new()?, Arc::clone(&auth));
            let profiles = ProfileService::new(transport, config.api_url.clone());
            let profile = if placeholder {
                profiles.load_profile_or_placeholder(&id).await
            } else {
                profiles.load_profile(&id).await?
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Status => {
            let state = auth.restore_session().await;
            print_session(&state);
            println!("Token: {}", auth.token_status().await?.display_message());
        }
    }

    Ok(())
}
