pub mod error;
pub mod loader;
pub mod report;
pub mod schema;

pub use error::{ConfigError, Result};
pub use loader::{build_cells, build_engine, engine_spec, from_toml_str, load_run};
pub use report::{CellReport, EvaluationReport};
pub use schema::{CellConfig, ProcessSection, RunConfig, RunSection};
