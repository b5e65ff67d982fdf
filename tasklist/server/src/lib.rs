pub mod config {
    use serde::Deserialize;
    use std::path::PathBuf;

    #[derive(Deserialize, Debug, Clone)]
    pub struct Config {
        #[serde(default)]
        pub database_url: Option<String>,
        pub password: String,
        #[serde(default = "default_port")]
        pub port: u16,
        #[serde(default = "default_public_dir")]
        pub public_dir: PathBuf,
        #[serde(default)]
        pub pghost: Option<String>,
        #[serde(default)]
        pub pgport: Option<u16>,
        #[serde(default)]
        pub pguser: Option<String>,
        #[serde(default)]
        pub pgpassword: Option<String>,
        #[serde(default)]
        pub pgdatabase: Option<String>,
    }

    impl Config {
        /// Loads configuration from environment variables.
        pub fn from_env() -> anyhow::Result<Self> {
            let settings = config::Config::builder()
                .add_source(config::Environment::default())
                .build()?;

            let config: Config = settings.try_deserialize()?;
            Ok(config)
        }

        /// Creates a configuration with only the shared password set.
        pub fn with_password(password: impl Into<String>) -> Self {
            Self {
                database_url: None,
                password: password.into(),
                port: default_port(),
                public_dir: default_public_dir(),
                pghost: None,
                pgport: None,
                pguser: None,
                pgpassword: None,
                pgdatabase: None,
            }
        }

        /// Returns the connection string for the database.
        ///
        /// `DATABASE_URL` wins when present. Otherwise the URL is assembled from the
        /// libpq variables (`PGHOST`, `PGPORT`, `PGUSER`, `PGPASSWORD`, `PGDATABASE`)
        /// with the same defaults libpq applies.
        pub fn connection_url(&self) -> String {
            if let Some(url) = &self.database_url {
                return url.clone();
            }

            let user = self.pguser.as_deref().unwrap_or("postgres");
            let host = self.pghost.as_deref().unwrap_or("localhost");
            let port = self.pgport.unwrap_or(5432);
            let database = percent_encode(self.pgdatabase.as_deref().unwrap_or(user));
            let user = percent_encode(user);
            match &self.pgpassword {
                Some(password) => {
                    let password = percent_encode(password);
                    format!("postgres://{user}:{password}@{host}:{port}/{database}")
                }
                None => format!("postgres://{user}@{host}:{port}/{database}"),
            }
        }
    }

    /// Escapes every byte outside the URL unreserved set as `%XX`.
    fn percent_encode(value: &str) -> String {
        value
            .bytes()
            .map(|byte| match byte {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                    (byte as char).to_string()
                }
                _ => format!("%{byte:02X}"),
            })
            .collect()
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_public_dir() -> PathBuf {
        PathBuf::from("public")
    }

}

pub mod assets;
pub mod auth;
pub mod db;
pub mod task;
pub mod view;
pub mod web;
