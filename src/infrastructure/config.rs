use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub server: ServerSettings,
    pub olap: OlapSettings,
    pub relational: Option<RelationalSettings>,
    pub graphql: Option<GraphqlSettings>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:3001".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct OlapSettings {
    pub host: String,
    pub database: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelationalSettings {
    pub endpoint: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphqlSettings {
    pub endpoint: String,
}

pub fn load_engine_config() -> anyhow::Result<EngineConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/engine"))
        .build()?;

    Ok(settings.try_deserialize()?)
}
