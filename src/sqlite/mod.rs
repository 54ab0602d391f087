// SQLite backend
//
// - config: opening the database file and connection pragmas
// - params: parameter conversion between RowValues and rusqlite values
// - query: result extraction and building
// - prepared: cached statement handles
// - session: the StatementExecutor implementation

pub mod config;
pub mod params;
pub mod prepared;
pub mod query;
pub mod session;

pub use params::Params;
pub use prepared::SqlitePreparedStatement;
pub use query::build_result_set;
pub use session::SqliteSession;
