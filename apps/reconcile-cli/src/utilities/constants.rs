pub const CLI_VERSION: &str = env!("CH_RECONCILE_VERSION");

pub const CLI_USER_DIRECTORY: &str = ".ch-reconcile";
pub const CLI_CONFIG_FILE: &str = "config.toml";

/// Environment variables overriding settings, e.g. `CH_RECONCILE_CONNECTION__HOST`
pub const ENV_SETTINGS_PREFIX: &str = "CH_RECONCILE";

pub const DEFAULT_CLICKHOUSE_USER: &str = "default";
pub const DEFAULT_CLICKHOUSE_HOST: &str = "localhost";
pub const DEFAULT_CLICKHOUSE_HTTP_PORT: u16 = 8123;
pub const DEFAULT_CLICKHOUSE_DATABASE: &str = "default";

pub const DEFAULT_POSTGRES_PORT: u16 = 5432;

pub const EXIT_CODE_FAILURE: u8 = 1;
pub const EXIT_CODE_CONFIGURATION: u8 = 2;
