pub mod api;
pub mod batch;
pub mod settings;

pub use api::{ApiServer, ApiServerConfig};
pub use batch::{load_actions, read_uri_file, run_batch, write_results, BatchAction, BatchError};
pub use settings::{load_config, mode_defaults, RunMode};
