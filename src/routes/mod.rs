pub mod auth;
pub mod data;
pub mod export;
pub mod github;
pub mod health;
pub mod stats;

pub use auth::{auth_status, login, logout};
pub use data::{add_record, clear_records, list_records};
pub use export::{export_csv, import_csv};
pub use github::{get_github_config, save_github_config, sync_from_github, upload_to_github};
pub use health::health_check;
pub use stats::{get_item_stats, get_stats};
