use crate::config::Config;
use crate::engine::EngineState;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub engine: EngineState,
    pub rng: StdRng,
    pub max_rows: usize,
    pub max_cols: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            engine: EngineState::new(config.rows, config.cols),
            rng,
            max_rows: config.max_rows,
            max_cols: config.max_cols,
        }
    }
}
