use std::fmt;
use std::str::FromStr;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::util::paths::is_safe_name;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobName(String);

impl JobName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for JobName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("job name is empty".to_string());
        }
        if !is_safe_name(s) {
            return Err(format!(
                "job {} name must use only letters, digits, '.', '-', '_'",
                s
            ));
        }
        Ok(JobName(s.to_string()))
    }
}

impl fmt::Display for JobName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A scalar YAML value that ends up in an environment variable.
///
/// Unquoted fractional numbers are rejected: YAML has already normalized
/// them (`1.20` reads as `1.2`), so their text could not be reproduced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum EnvValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl<'de> Deserialize<'de> for EnvValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(EnvValueVisitor)
    }
}

struct EnvValueVisitor;

impl<'de> Visitor<'de> for EnvValueVisitor {
    type Value = EnvValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, integer or boolean")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<EnvValue, E> {
        Ok(EnvValue::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<EnvValue, E> {
        Ok(EnvValue::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<EnvValue, E> {
        Ok(i64::try_from(v).map_or_else(|_| EnvValue::Str(v.to_string()), EnvValue::Int))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<EnvValue, E> {
        Err(E::custom(format!(
            "unquoted number {} cannot be kept as written; quote it as a string",
            v
        )))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<EnvValue, E> {
        Ok(EnvValue::Str(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<EnvValue, E> {
        Ok(EnvValue::Str(v))
    }
}

impl EnvValue {
    pub fn to_env_string(&self) -> String {
        match self {
            EnvValue::Bool(true) => "true".to_string(),
            EnvValue::Bool(false) => "false".to_string(),
            EnvValue::Int(v) => v.to_string(),
            EnvValue::Str(v) => v.clone(),
        }
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Str(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RunMode {
    pub dry_run: bool,
    pub verbose: bool,
}
