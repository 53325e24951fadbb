use std::env;

use anyhow::{bail, Context, Result};

use fieldops::{
    auth::{jwt::JwtService, local::PgAuth, synthetic_email, AuthProvider},
    config::AppConfig,
    db,
    models::NewProfile,
    roles::{ApprovalStatus, Role},
    store::{JobStore, PgStore},
};

const USAGE: &str = "Usage:
  maintenance create-admin <username> <password> <full name>
  maintenance add-department <name>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        Some("create-admin") => match &args[1..] {
            [username, password, name @ ..] if !name.is_empty() => {
                create_admin(username, password, &name.join(" ")).await?
            }
            _ => usage(),
        },
        Some("add-department") if args.len() > 1 => add_department(&args[1..].join(" ")).await?,
        Some("add-department") | None => usage(),
        Some(cmd) => {
            eprintln!("Unknown command: {cmd}\n{USAGE}");
            std::process::exit(1);
        }
    }

    Ok(())
}

fn usage() -> ! {
    eprintln!("{USAGE}");
    std::process::exit(1);
}

async fn load() -> Result<(AppConfig, db::PgPool)> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        pool_size = 1,
        "loaded backend configuration"
    );
    let pool = db::init_pool_with_size(&config.database_url, 1)?;
    let migration_pool = pool.clone();
    tokio::task::spawn_blocking(move || db::run_migrations(&migration_pool))
        .await
        .context("migration task panicked")??;
    Ok((config, pool))
}

/// Sign-up only ever produces pending staff, so the first administrator is
/// created here with an approved profile.
async fn create_admin(username: &str, password: &str, full_name: &str) -> Result<()> {
    let (config, pool) = load().await?;
    let email = synthetic_email(username, &config.auth_email_domain)?;
    let auth = PgAuth::new(pool.clone(), JwtService::from_config(&config));
    let store = PgStore::new(pool);

    let user = auth
        .sign_up(&email, password)
        .await
        .with_context(|| format!("failed to create identity {email}"))?;
    let profile = store
        .insert_profile(NewProfile {
            id: user.id,
            username: username.trim().to_lowercase(),
            full_name: full_name.trim().to_string(),
            phone: None,
            role: Role::Admin.as_str().to_string(),
            status: ApprovalStatus::Approved.as_str().to_string(),
            department_id: None,
        })
        .await
        .context("failed to create administrator profile")?;

    println!("Created administrator {} ({})", profile.username, profile.id);
    Ok(())
}

async fn add_department(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("department name must not be empty");
    }
    let (_, pool) = load().await?;
    let department = PgStore::new(pool)
        .insert_department(name)
        .await
        .context("failed to create department")?;
    println!("Created department #{} {}", department.id, department.name);
    Ok(())
}
