//! Default values shared by configuration, the query compilers and the CLI.

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 3000;

/// Default bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Number of images returned when the caller does not pass a usable `limit`.
pub const DEFAULT_IMAGE_LIMIT: usize = 10;

/// Server-side ceiling for image query limits.
pub const MAX_IMAGE_LIMIT: usize = 100;

/// Default and maximum number of users returned by a user query.
pub const USER_QUERY_LIMIT: usize = 100;

/// Maximum accepted multipart upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 << 20;

/// Session token lifetime.
pub const DEFAULT_TOKEN_TTL_SECS: u64 = 3600;

/// Longest accepted session token lifetime (ten years).
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 3600;

/// Cookie carrying the session token.
pub const DEFAULT_COOKIE_NAME: &str = "token";

/// Upper bound on the time a single request may take end to end.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Environment variable overriding `auth.jwt_secret`.
pub const JWT_KEY_ENV: &str = "IMGREPO_JWT_KEY";

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "IMGREPO_HOME";

/// Default configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "imgrepo.toml";
