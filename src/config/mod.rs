//! Unified configuration system.
//!
//! Configuration is assembled from tiers, merged field-by-field:
//! 1. **Defaults** - built into the binary
//! 2. **Project** - `$CWD/todo-board/config.yaml`
//! 3. **User** - `~/.todo-board/config.yaml`
//! 4. **Environment** - variables listed below
//!
//! CLI flags are applied on top by the binary.
//!
//! ## Environment Variables
//! - `TODO_BOARD_CONFIG_PATH` - Explicit config file (replaces the file tiers)
//! - `TODO_BOARD_PROJECT_DIR` - Project config dir (default: `./todo-board`)
//! - `TODO_BOARD_USER_DIR` - User config dir (default: `~/.todo-board`)
//! - `TODO_BOARD_DB_PATH` - Database path
//! - `SERVER_HOST`, `SERVER_PORT` - Bind address
//! - `APP_ENV` - `development` or `production`
//! - `APP_DEBUG` - Show error details (ignored in production)
//! - `DATE_FORMAT` - strftime pattern for task dates
//! - `APP_TIMEZONE`, `DATE_TIMEZONE` - IANA zone for task dates
//! - `CSRF_TOKEN_TTL` - Anti-forgery token lifetime in seconds

mod loader;
mod merge;
mod types;

pub use loader::{CONFIG_FILE, ConfigLoader, ConfigPaths, ConfigTier, apply_env_overrides};
pub use merge::{merge_all, merge_layers};
pub use types::*;
