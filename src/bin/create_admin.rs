//! Creates an admin account directly in the database.
//!
//! The password is read from `ADMIN_PASSWORD` when set, otherwise from the first line
//! of stdin, so it never appears in the process list or shell history.

use std::io::{self, BufRead, Write};

use clap::Parser;
use portfolio_backend::{
    auth::{Argon2Hasher, PasswordHasher},
    config::AppConfig,
    repository::{NewAdminUser, PostgresRepository, UserStore},
};
use sqlx::postgres::PgPoolOptions;
use validator::Validate;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Create an admin user for the portfolio backend
#[derive(Parser)]
#[command(name = "create_admin")]
#[command(version, about, long_about = None)]
struct Args {
    /// Login email of the new admin
    #[arg(long)]
    email: String,

    /// Display name
    #[arg(long)]
    name: String,

    /// Run pending migrations before inserting
    #[arg(long, default_value_t = false)]
    migrate: bool,
}

#[derive(Validate)]
struct NewAdminInput {
    #[validate(email)]
    email: String,
    #[validate(length(min = 2, max = 255))]
    name: String,
    #[validate(length(min = 8))]
    password: String,
}

fn read_password() -> Result<String, BoxError> {
    if let Ok(password) = std::env::var("ADMIN_PASSWORD") {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "create_admin=info,portfolio_backend=info".into()),
        )
        .init();

    if let Err(e) = run(Args::parse()).await {
        tracing::error!(error = %e, "failed to create admin");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    let password = read_password()?;

    let input = NewAdminInput {
        email: args.email.trim().to_string(),
        name: args.name.trim().to_string(),
        password,
    };
    if let Err(errors) = input.validate() {
        for error in portfolio_backend::validation::collect_field_errors(&errors) {
            eprintln!("{}: {}", error.field, error.message);
        }
        return Err("invalid input".into());
    }

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.db_url)
        .await?;
    if args.migrate {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }
    let repo = PostgresRepository::new(pool);

    let password_hash = Argon2Hasher::new().hash(&input.password)?;
    let user = repo
        .create_user(NewAdminUser {
            email: input.email,
            password_hash,
            name: input.name,
        })
        .await?;

    tracing::info!(user_id = user.id, email = %user.email, "admin user created");
    Ok(())
}
