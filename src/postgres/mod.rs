// PostgreSQL backend
//
// - config: client configuration from a target and credentials
// - params: parameter conversion between RowValues and PostgreSQL types
// - query: result extraction and building
// - session: the StatementExecutor implementation

pub mod config;
pub mod params;
pub mod query;
pub mod session;

pub use params::Params;
pub use query::build_result_set;
pub use session::PostgresSession;
