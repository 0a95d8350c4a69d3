use anyhow::Result;
use chrono::Utc;
use migration::{Migrator, MigratorTrait};
use model::entities::user;
use sea_orm::{ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set};
use tracing::{debug, error, info, trace};

use crate::auth::{self, SEED_ACCOUNTS};

pub async fn init_database(database_url: &str, seed_demo: bool) -> Result<()> {
    trace!("Entering init_database function");
    info!("Initializing database");

    let db: DatabaseConnection = match Database::connect(database_url).await {
        Ok(connection) => {
            info!("Successfully connected to database");
            connection
        }
        Err(e) => {
            error!("Failed to connect to database '{}': {}", database_url, e);
            return Err(e.into());
        }
    };

    info!("Running database migrations");
    match Migrator::up(&db, None).await {
        Ok(_) => {
            info!("Database migrations completed successfully");
        }
        Err(e) => {
            error!("Failed to run database migrations: {}", e);
            return Err(e.into());
        }
    }

    if seed_demo {
        info!("Seeding demo accounts");
        seed_demo_accounts(&db).await?;
    }

    info!("Database initialization completed successfully!");
    Ok(())
}

/// Insert the two demo accounts unless they already exist.
///
/// The passwords are hashed like any regular registration; the login-time
/// literal bypass for these accounts does not depend on what is stored here.
pub async fn seed_demo_accounts(db: &DatabaseConnection) -> Result<(), DbErr> {
    for seed in SEED_ACCOUNTS {
        let existing = user::Entity::find()
            .filter(user::Column::Email.eq(seed.email))
            .one(db)
            .await?;
        if existing.is_some() {
            debug!("Demo account {} already present, skipping", seed.email);
            continue;
        }

        let hash = auth::hash_password(seed.password)
            .map_err(|e| DbErr::Custom(format!("failed to hash seed password: {e}")))?;

        let created = user::ActiveModel {
            name: Set(seed.name.to_string()),
            email: Set(seed.email.to_string()),
            password: Set(hash),
            role: Set(seed.role),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(db)
        .await?;
        info!("Seeded demo account {} with ID {}", created.email, created.id);
    }
    Ok(())
}
