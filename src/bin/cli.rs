use bsm_portal::{
    backend::{self, SignInRequest},
    config::{AppConfig, BackendConfig},
    models::Role,
    services::AuthService,
    session::SessionStore,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bsm-cli")]
#[command(about = "CLI tool for checking the BSM portal's auth backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which auth backend the portal would use
    Status,

    /// Sign in against the configured backend and print the session user
    SignIn {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Portal to sign in to (admin or customer)
        #[arg(short, long, default_value = "customer")]
        role: Role,

        /// Password (will prompt if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Send a password reset email
    ResetPassword {
        /// Email address
        #[arg(short, long)]
        email: String,
    },
}

fn get_password(prompt: &str) -> anyhow::Result<String> {
    use std::io::{self, Write};
    print!("{}: ", prompt);
    io::stdout().flush()?;

    Ok(rpassword::read_password()?)
}

fn print_notices(store: &SessionStore) {
    for notice in store.take_notices() {
        println!("  [{:?}] {}", notice.level, notice.message);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bsm_portal=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let backend_config = BackendConfig::from_env();
    let service = AuthService::new(backend::from_config(&backend_config, &config.site_url));

    let store = SessionStore::new();
    service.initialize(&store);

    match cli.command {
        Commands::Status => match &backend_config {
            BackendConfig::Remote { url, .. } => {
                println!("Backend: remote");
                println!("  Endpoint: {}", url);
                println!("  Site URL: {}", config.site_url);
            }
            BackendConfig::Mock => {
                println!("Backend: mock (demo mode)");
                println!("  Set SUPABASE_URL and SUPABASE_ANON_KEY to use a hosted backend");
            }
        },

        Commands::SignIn {
            email,
            role,
            password,
        } => {
            let password = match password {
                Some(pw) => pw,
                None => get_password("Password")?,
            };

            let request = SignInRequest {
                email,
                password,
                role,
            };

            match service.sign_in(&store, request).await {
                Ok(user) => {
                    println!("✅ Signed in");
                    println!("  ID: {}", user.id);
                    println!("  Email: {}", user.email);
                    println!("  Name: {}", user.display_name());
                    println!("  Role: {}", user.role);
                    println!("  Verified: {}", user.is_verified);
                    println!("  Dashboard: {}", user.role.dashboard_path());
                    print_notices(&store);
                }
                Err(err) => {
                    eprintln!("❌ Sign in failed: {}", err);
                    std::process::exit(1);
                }
            }
        }

        Commands::ResetPassword { email } => {
            match service.reset_password(&store, &email).await {
                Ok(()) => {
                    println!("✅ Password reset requested for {}", email);
                    print_notices(&store);
                }
                Err(err) => {
                    eprintln!("❌ Password reset failed: {}", err);
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}
