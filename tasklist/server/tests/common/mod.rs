use sea_orm::{ConnectionTrait, Database};
use tasklist_server::db::Gateway;
use testcontainers_modules::testcontainers::runners::AsyncRunner;
use testcontainers_modules::{postgres, testcontainers};

const SCHEMA: &str = include_str!("../../schema.sql");

/// Test context backed by a throwaway Postgres container.
pub struct TestContext {
    #[allow(dead_code)] // container is kept to ensure it's not dropped
    pub container: testcontainers::ContainerAsync<postgres::Postgres>,
    pub gateway: Gateway,
}

pub async fn setup_container() -> anyhow::Result<testcontainers::ContainerAsync<postgres::Postgres>>
{
    let container = postgres::Postgres::default().start().await?;
    Ok(container)
}

/// Applies the schema and returns a gateway pointed at the container.
pub async fn setup_gateway(
    container: &testcontainers::ContainerAsync<postgres::Postgres>,
) -> anyhow::Result<Gateway> {
    let host = container.get_host().await?;
    let port = container.get_host_port_ipv4(5432).await?;
    let db_url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let db = Database::connect(&db_url).await?;
    db.execute_unprepared(SCHEMA).await?;
    db.close().await?;

    Ok(Gateway::postgres(db_url))
}

pub async fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_env_filter("debug").try_init();
    let container = setup_container().await?;
    let gateway = setup_gateway(&container).await?;
    Ok(TestContext { container, gateway })
}
