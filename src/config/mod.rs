pub mod load;
pub mod model;

pub use load::{load_config, parse_config};
pub use model::{Config, ConfigOptions, EnvMap, JobConfig, Settings};
