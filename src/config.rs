use std::path::PathBuf;

/// Environment variable naming the data file when no argument is given.
pub const DATA_PATH_ENV: &str = "SALES_DASH_DATA";

pub const DEFAULT_DATA_PATH: &str = "data.csv";

/// Startup configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Sales file loaded at startup.
    pub data_path: PathBuf,
}

impl AppConfig {
    /// First CLI argument, else `$SALES_DASH_DATA`, else `data.csv`.
    pub fn from_env() -> Self {
        Self::resolve(
            std::env::args_os().nth(1).map(PathBuf::from),
            std::env::var_os(DATA_PATH_ENV).map(PathBuf::from),
        )
    }

    fn resolve(arg: Option<PathBuf>, env: Option<PathBuf>) -> Self {
        let given = |p: &PathBuf| !p.as_os_str().is_empty();
        let data_path = arg
            .filter(given)
            .or_else(|| env.filter(given))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        AppConfig { data_path }
    }
}
