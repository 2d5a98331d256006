//! Bootstrap admin seeder
//! Creates the initial admin account when the directory has none. Safe to
//! run repeatedly.

use citizen_registry::{
    auth::password::PasswordHasher,
    config::AppConfig,
    db,
    models::user::{Address, CreateUserRequest, Role},
    repository::UserRepository,
    telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = AppConfig::from_env()?;
    telemetry::init_telemetry(&config);

    let pool = db::create_pool(&config.database).await?;
    db::run_migrations(&pool).await?;

    let repo = UserRepository::new(pool);

    if let Some(admin) = repo.find_any_admin().await? {
        tracing::info!(username = %admin.username, "Admin user already exists");
        return Ok(());
    }

    let password = std::env::var("REGISTRY_SEED_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "admin123!".to_string());

    let hasher = PasswordHasher::from_config(&config)?;
    let password_hash = hasher.hash(&password)?;

    let req = CreateUserRequest {
        username: "admin".to_string(),
        email: "admin@admin.com".to_string(),
        password,
        role: Role::Admin,
        firstname: "Admin".to_string(),
        lastname: "Admin".to_string(),
        phone_number: "1234567890".to_string(),
        address: Address {
            city: "City".to_string(),
            street: "Street".to_string(),
            number: "123".to_string(),
            postcode: "00000".to_string(),
        },
        ssn: "012345678".to_string(),
    };

    let user = repo.create(&req, &password_hash).await?;

    tracing::info!(username = %user.username, "Admin user created successfully");
    tracing::warn!("Change the seeded admin password before going live");

    Ok(())
}
