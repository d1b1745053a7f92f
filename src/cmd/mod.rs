//! CLI command implementations.
//!
//! | Module    | Commands handled |
//! |-----------|------------------|
//! | `review`  | `Review`         |
//! | `phases`  | `Phases`         |
//! | `config`  | `Config`         |

pub mod config;
pub mod phases;
pub mod review;

pub use config::cmd_config;
pub use phases::cmd_phases;
pub use review::cmd_review;

use std::path::{Path, PathBuf};

/// Resolve a user-supplied path against the project directory.
pub fn resolve_path(project_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        project_dir.join(path)
    }
}
