use std::path::PathBuf;

pub const DEFAULT_DB_FILE: &str = "school.sqlite3";

#[derive(Debug, Clone)]
pub struct Config {
    pub log_filter: String,
    pub workspace: Option<PathBuf>,
    pub db_file: String,
}

impl Config {
    pub fn from_env() -> Self {
        let log_filter = std::env::var("SCHOOLD_LOG").unwrap_or_else(|_| "info".to_string());

        let workspace = std::env::var("SCHOOLD_WORKSPACE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let db_file = std::env::var("SCHOOLD_DB_FILE")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_FILE.to_string());

        Self {
            log_filter,
            workspace,
            db_file,
        }
    }
}
