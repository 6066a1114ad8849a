use tokio::process::Command;

use crate::{
    core::{
        db::init_pool,
        migration::{list_migrations, revert_latest, run_migrations},
    },
    settings::Config,
};

/// Scaffolds a reversible `.up.sql`/`.down.sql` pair under `./migrations`.
pub async fn db_generate(migration_name: &str) -> anyhow::Result<()> {
    let status = Command::new("sqlx")
        .arg("migrate")
        .arg("add")
        .arg(migration_name)
        .arg("-r")
        .status()
        .await?;
    if !status.success() {
        anyhow::bail!("sqlx migrate add exited with {}", status);
    }
    Ok(())
}

pub async fn db_list(config: &Config) -> anyhow::Result<()> {
    let pool = init_pool(config).await?;
    for item in list_migrations(&pool).await? {
        let state = if item.applied { "installed" } else { "pending" };
        println!("{}/{} {}", item.version, state, item.description);
    }
    Ok(())
}

pub async fn db_migrate(config: &Config) -> anyhow::Result<()> {
    let pool = init_pool(config).await?;
    let applied = run_migrations(&pool).await?;
    if applied.is_empty() {
        println!("nothing to migrate");
    }
    for version in applied {
        println!("applied {}", version);
    }
    Ok(())
}

pub async fn db_revert(config: &Config) -> anyhow::Result<()> {
    let pool = init_pool(config).await?;
    match revert_latest(&pool).await? {
        Some(version) => println!("reverted {}", version),
        None => println!("no migration to revert"),
    }
    Ok(())
}
