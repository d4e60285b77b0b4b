use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A rules file: named queries evaluated against every document.
#[derive(Debug, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Fixed reference time for `age()` (RFC 3339)
    #[serde(default)]
    pub now: Option<String>,
    pub fields: Vec<FieldRule>,
}

impl RulesConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from_str(source, ::config::FileFormat::Yaml))
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FieldRule {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub on_error: OnError,
}

/// What to do when a field's query fails.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Abort evaluation of the document
    #[default]
    Fail,
    /// Emit JSON null
    Null,
    /// Leave the field out
    Skip,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct RuntimeConfig {
    /// Reference time for `age()` without a reference path
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub pretty: bool,
}

impl RuntimeConfig {
    pub fn reference_time(&self) -> anyhow::Result<Option<OffsetDateTime>> {
        self.now
            .as_deref()
            .map(|now| {
                OffsetDateTime::parse(now, &Rfc3339)
                    .with_context(|| format!("Config: invalid reference time {now}"))
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rules_yaml() {
        let rules = RulesConfig::from_yaml(
            r#"
now: "2020-01-01T00:00:00Z"
fields:
  - name: max_ncd
    query: additional_drivers.map(ncd).max(5)
  - name: area
    query: "policy.address.postcode.regex(^[A-Za-z]{1,2})"
    on_error: "null"
"#,
        )
        .unwrap();
        assert_eq!(rules.now.as_deref(), Some("2020-01-01T00:00:00Z"));
        assert_eq!(rules.fields.len(), 2);
        assert_eq!(rules.fields[0].on_error, OnError::Fail);
        assert_eq!(rules.fields[1].on_error, OnError::Null);
    }

    #[test]
    fn reference_time_is_rfc3339() {
        let runtime = RuntimeConfig {
            now: Some("2020-01-01T00:00:00Z".into()),
            pretty: false,
        };
        assert_eq!(runtime.reference_time().unwrap().unwrap().year(), 2020);

        let runtime = RuntimeConfig {
            now: Some("yesterday".into()),
            pretty: false,
        };
        assert!(runtime.reference_time().is_err());
    }
}
