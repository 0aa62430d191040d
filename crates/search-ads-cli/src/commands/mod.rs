pub mod campaigns;
pub mod config;
pub mod queue;
pub mod report;
pub mod store;

use std::error::Error;
use std::path::PathBuf;

use search_ads_core::{Config, Connection, DataBase, HttpTransport, SearchAds, SyncManager};

/// Loaded configuration plus the transport built from it.
pub struct Session {
    pub config: Config,
    transport: HttpTransport,
}

impl Session {
    pub fn open() -> Result<Self, Box<dyn Error>> {
        let config = Config::load()?;
        let transport = HttpTransport::new(&config.api.base_url)?.with_timeout(config.timeout());
        Ok(Self { config, transport })
    }

    pub fn connection(&self) -> Connection<'_> {
        Connection::new(&self.transport, self.config.credentials())
            .with_api_version(self.config.api.api_version.clone())
    }

    /// Client bound to the configured organization.
    pub fn client(&self) -> Result<SearchAds<'_>, Box<dyn Error>> {
        let org_name = self.config.org_name()?;
        Ok(SearchAds::connect(self.connection(), org_name)?)
    }

    pub fn sync_manager(&self) -> SyncManager {
        SyncManager::new(self.config.credentials()).with_policy(self.config.sync.replay_policy)
    }
}

/// The local store and where it lives.
pub fn open_store(config: &Config) -> Result<(PathBuf, DataBase), Box<dyn Error>> {
    let path = config.store_path()?;
    let database = DataBase::load(&path)?;
    Ok((path, database))
}

/// Render a JSON scalar without quotes.
pub fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}
