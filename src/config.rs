use std::{fmt, fs, path::Path, time::Duration};

use crate::{Error, Result};

/// Network location of the database server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Authentication material and default schema for new sessions.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub database: String,
}

impl Credentials {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            database: database.into(),
        }
    }
}

// The password stays out of logs and error messages.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .finish()
    }
}

/// Pool parameters, fixed for the lifetime of a [`Pool`](crate::Pool).
///
/// Build one programmatically with [`PoolConfig::new`] and the setters, or
/// load it from a `key=value` file with [`PoolConfig::from_file`].
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub(crate) endpoint: Endpoint,
    pub(crate) credentials: Credentials,
    pub(crate) init_size: u32,
    pub(crate) max_size: u32,
    pub(crate) max_idle_time: Duration,
    pub(crate) acquire_timeout: Duration,
}

impl PoolConfig {
    /// Construct `Self` with default sizing.
    ///
    /// See the source of this method for the current defaults.
    #[must_use]
    pub fn new(endpoint: Endpoint, credentials: Credentials) -> Self {
        Self {
            endpoint,
            credentials,
            init_size: 1,
            max_size: 10,
            max_idle_time: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Set the number of sessions opened eagerly at startup.
    ///
    /// This is also the floor the reaper will not cross. Must be at least 1.
    #[must_use]
    pub fn init_size(mut self, init_size: u32) -> Self {
        self.init_size = init_size;
        self
    }

    /// Set the maximum number of sessions the pool will keep open.
    ///
    /// Be mindful of the connection limit of your database server as well as
    /// other applications which may want to connect to it.
    #[must_use]
    pub fn max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    /// Set how long a session may sit idle before it becomes eligible for
    /// eviction by the reaper.
    #[must_use]
    pub fn max_idle_time(mut self, max_idle_time: Duration) -> Self {
        self.max_idle_time = max_idle_time;
        self
    }

    /// Set the maximum amount of time to spend waiting in
    /// [`Pool::acquire`](crate::Pool::acquire).
    #[must_use]
    pub fn acquire_timeout(mut self, acquire_timeout: Duration) -> Self {
        self.acquire_timeout = acquire_timeout;
        self
    }

    /// Load a configuration from a newline-delimited `key=value` file.
    ///
    /// Recognized keys: `ip`, `port`, `username`, `password`, `dbname`,
    /// `initSize`, `maxSize`, `maxIdleTime` (seconds), `connectionTimeout`
    /// (milliseconds). All are required. Unknown keys are ignored and lines
    /// without a `=` (blank lines, comments) are skipped.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|error| Error::Config(format!("{}: {error}", path.display())))?;
        Self::parse(&contents)
    }

    fn parse(contents: &str) -> Result<Self> {
        let mut host = None;
        let mut port = None;
        let mut username = None;
        let mut password = None;
        let mut database = None;
        let mut init_size = None;
        let mut max_size = None;
        let mut max_idle_time = None;
        let mut acquire_timeout = None;

        for line in contents.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim_end_matches('\r');
            match key {
                "ip" => host = Some(value.to_owned()),
                "port" => port = Some(parse_num::<u16>("port", value)?),
                "username" => username = Some(value.to_owned()),
                "password" => password = Some(value.to_owned()),
                "dbname" => database = Some(value.to_owned()),
                "initSize" => init_size = Some(parse_num::<u32>("initSize", value)?),
                "maxSize" => max_size = Some(parse_num::<u32>("maxSize", value)?),
                "maxIdleTime" => {
                    max_idle_time = Some(Duration::from_secs(
                        parse_num::<u64>("maxIdleTime", value)?,
                    ))
                }
                "connectionTimeout" => {
                    acquire_timeout = Some(Duration::from_millis(parse_num::<u64>(
                        "connectionTimeout",
                        value,
                    )?))
                }
                _ => {}
            }
        }

        let config = Self {
            endpoint: Endpoint {
                host: required("ip", host)?,
                port: required("port", port)?,
            },
            credentials: Credentials {
                username: required("username", username)?,
                password: required("password", password)?,
                database: required("dbname", database)?,
            },
            init_size: required("initSize", init_size)?,
            max_size: required("maxSize", max_size)?,
            max_idle_time: required("maxIdleTime", max_idle_time)?,
            acquire_timeout: required("connectionTimeout", acquire_timeout)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.init_size == 0 {
            return Err(Error::Config("initSize must be at least 1".into()));
        }
        if self.max_size < self.init_size {
            return Err(Error::Config(format!(
                "maxSize ({}) must be at least initSize ({})",
                self.max_size, self.init_size
            )));
        }
        Ok(())
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("invalid value for {key}: {value:?}")))
}

fn required<T>(key: &str, value: Option<T>) -> Result<T> {
    value.ok_or_else(|| Error::Config(format!("missing required key: {key}")))
}
