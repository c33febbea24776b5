use std::fmt::{self, Display};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_subscriber::filter::{Directive, LevelFilter};

/// Global log level, e.g. `info`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogLevel(pub LevelFilter);

impl FromStr for LogLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed: LevelFilter = s
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid log level: {}", s))?;
        Ok(Self(parsed))
    }
}

impl Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for LogLevel {
    fn default() -> Self {
        LogLevel(LevelFilter::INFO)
    }
}

impl From<LogLevel> for Directive {
    fn from(val: LogLevel) -> Self {
        val.0.into()
    }
}

/// Per-module level directive, e.g. `inari_admin=debug`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetLevel(pub Directive);

impl FromStr for TargetLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !s.contains('=') {
            return Err(anyhow::anyhow!("invalid target log level directive: {}", s));
        }
        let parsed = s
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid target log level directive: {}", s))?;
        Ok(Self(parsed))
    }
}

impl Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<TargetLevel> for Directive {
    fn from(val: TargetLevel) -> Self {
        val.0
    }
}

macro_rules! impl_string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::from_str(&s).map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    };
}

impl_string_serde!(LogLevel);
impl_string_serde!(TargetLevel);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_levels() {
        assert_eq!(
            LogLevel::from_str("debug").unwrap(),
            LogLevel(LevelFilter::DEBUG)
        );
        assert!(LogLevel::from_str("loud").is_err());

        let target = TargetLevel::from_str("inari_admin=trace").unwrap();
        assert_eq!(target.to_string(), "inari_admin=trace");
        assert!(TargetLevel::from_str("trace").is_err());
    }
}
