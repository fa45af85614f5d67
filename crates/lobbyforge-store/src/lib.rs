//! Durable storage for Lobbyforge, backed by SQLite.
//!
//! [`Database`] owns the connection pool and the schema. It hands out the
//! two adapters the room core needs:
//!
//! - [`SqliteRoomStore`]: a [`RoomStore`](lobbyforge_room::RoomStore)
//!   over a key-value table
//! - [`SqliteMatchRecorder`]: a
//!   [`MatchRecorder`](lobbyforge_room::MatchRecorder) appending to a
//!   match history table
//!
//! ```no_run
//! # async fn demo() -> Result<(), lobbyforge_store::DbError> {
//! use lobbyforge_store::Database;
//!
//! let db = Database::new("lobbyforge.db").await?;
//! let rooms = db.rooms();
//! let history = db.matches();
//! # let _ = (rooms, history);
//! # Ok(())
//! # }
//! ```

mod db;
mod error;
mod history;
mod rooms;

pub use db::Database;
pub use error::DbError;
pub use history::{MatchStart, SqliteMatchRecorder};
pub use rooms::SqliteRoomStore;
