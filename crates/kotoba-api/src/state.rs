use kotoba_practice::PracticeSystem;
use sqlx::PgPool;

use crate::config::{ApiConfig, Environment};

#[derive(Clone, Debug)]
pub struct ApiState {
    pub practice: PracticeSystem,
    pub environment: Environment,
}

impl ApiState {
    pub async fn new(config: &ApiConfig) -> anyhow::Result<Self> {
        let pool = kotoba_db::create_pool(&config.database_url).await?;
        kotoba_db::ensure_db_and_migrate(&config.database_url, &pool).await?;

        Ok(Self {
            practice: PracticeSystem::new(pool),
            environment: config.env,
        })
    }

    pub const fn pool(&self) -> &PgPool {
        self.practice.pool()
    }
}
