use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub catalog: CatalogConfig,
}

/// Catalog-wide tunables. Carried explicitly in `AppState` so the search
/// and catalog services never reach for ambient globals.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Number of decimal digits all monetary values are compared at.
    pub money_scale: u32,
    /// The only page sizes the search endpoint accepts.
    pub page_sizes: Vec<u64>,
    pub default_page_size: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            money_scale: 2,
            page_sizes: vec![5, 10, 25, 50, 75],
            default_page_size: 25,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        Ok(Self {
            port,
            database_url,
            host,
            catalog: CatalogConfig::default(),
        })
    }
}
