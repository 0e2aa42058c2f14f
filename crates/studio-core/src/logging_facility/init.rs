//! Global subscriber installation for the shell binary

use std::sync::Once;

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Output style selected with `--log-format`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// `pretty`: readable lines on stderr, warnings and above
    Development,
    /// `json`: one JSON object per line on stderr, info and above
    Production,
    /// Bare registry; tests add the capture layer themselves
    Test,
}

impl Profile {
    /// Directive applied when `RUST_LOG` is unset
    pub fn default_directive(self) -> &'static str {
        match self {
            Profile::Development => "studio=warn",
            Profile::Production => "studio=info",
            Profile::Test => "off",
        }
    }

    fn filter(self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" | "dev" | "development" => Ok(Profile::Development),
            "json" | "prod" | "production" => Ok(Profile::Production),
            "test" => Ok(Profile::Test),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

static INSTALLED: Once = Once::new();

/// Install the process-wide subscriber for `profile`
///
/// Only the first call has an effect.
pub fn init(profile: Profile) {
    INSTALLED.call_once(|| {
        let installed = match profile {
            Profile::Development => tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Production => tracing_subscriber::fmt()
                .json()
                .with_writer(std::io::stderr)
                .with_env_filter(profile.filter())
                .try_init()
                .map_err(|e| e.to_string()),
            Profile::Test => {
                // the capture layer may already own the global slot
                let _ = tracing_subscriber::registry().try_init();
                Ok(())
            }
        };
        if let Err(e) = installed {
            eprintln!("logging disabled: {}", e);
        }
    });
}
