use std::collections::HashSet;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use sqlx::{Row, SqlitePool};

use hs_projects::config::Settings;
use hs_projects::members::SqliteMemberDirectory;
use hs_projects::models::member::NewMember;
use hs_projects::roles::RoleRegistry;
use hs_projects::validation::DATE_FORMAT;
use hs_projects::{db, sessions};

#[derive(Parser, Debug)]
#[command(author, version, about = "hs-projects maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    Migrate,
    /// Show migration status against the current database
    MigrateStatus,
    /// Create a member who can log in
    AddMember {
        username: String,
        /// Read from HS_MEMBER_PASSWORD when omitted
        #[arg(long, env = "HS_MEMBER_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "")]
        course: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Comma separated role tags
        #[arg(long, default_value = "")]
        tags: String,
        /// YYYY-MM-DD, defaults to today
        #[arg(long)]
        join_date: Option<String>,
    },
    /// Load a roles file and print what each role grants
    CheckRoles { path: Option<PathBuf> },
    /// Delete expired sessions
    PurgeSessions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Migrate => {
            let pool = db::connect(&settings.database_url).await?;
            db::migrate(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = db::connect(&settings.database_url).await?;
            print_status(&pool).await?;
        }
        Commands::AddMember {
            username,
            password,
            name,
            course,
            email,
            tags,
            join_date,
        } => {
            let join_date = match join_date {
                Some(raw) => NaiveDate::parse_from_str(&raw, DATE_FORMAT)
                    .with_context(|| format!("invalid join date `{raw}`, expected YYYY-MM-DD"))?,
                None => chrono::Utc::now().date_naive(),
            };
            let tags = tags
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(String::from)
                .collect();

            let pool = db::init(&settings.database_url).await?;
            let member = SqliteMemberDirectory::new(pool)
                .insert(&NewMember {
                    name: name.unwrap_or_else(|| username.clone()),
                    username,
                    course,
                    email,
                    join_date,
                    tags,
                    password,
                })
                .await?;
            println!("Created member {} (id {}) with tags [{}]", member.username, member.id, member.tags.join(", "));
        }
        Commands::CheckRoles { path } => {
            let path = path.unwrap_or(settings.roles_path);
            let registry = RoleRegistry::load(&path)
                .with_context(|| format!("roles file {} is invalid", path.display()))?;
            for role in registry.role_names() {
                let granted: Vec<String> = registry
                    .permissions_for([role])
                    .into_iter()
                    .map(|permission| permission.to_string())
                    .collect();
                println!("{:<20} {}", role, granted.join(", "));
            }
        }
        Commands::PurgeSessions => {
            let pool = db::init(&settings.database_url).await?;
            let purged = sessions::purge_expired(&pool).await?;
            println!("Removed {} expired session(s)", purged);
        }
    }

    Ok(())
}

async fn print_status(pool: &SqlitePool) -> anyhow::Result<()> {
    let migrator = sqlx::migrate!();

    // If the migrations table doesn't exist, nothing is applied yet
    let has_table: Option<String> =
        sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
            .fetch_optional(pool)
            .await?;
    let applied_versions: HashSet<i64> = if has_table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let status = if applied_versions.contains(&migration.version) { "applied" } else { "pending" };
        let desc = migration.description.trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}
