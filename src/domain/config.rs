//! Declarative configuration types.
//!
//! `ModelsConfig` is the model catalogue (what to instantiate and how to plot
//! it); `AppConfig` is the runtime configuration of the binary. Both are built
//! once at startup and passed down explicitly.

use std::fmt;
use std::marker::PhantomData;
use std::path::PathBuf;

use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::domain::Domain;
use crate::error::EngineError;

/// A string-keyed mapping that keeps document order and rejects duplicate keys.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<T>(Vec<(String, T)>);

impl<T> Ordered<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(k, _)| k.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&T> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T> Default for Ordered<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, T> FromIterator<(K, T)> for Ordered<T> {
    fn from_iter<I: IntoIterator<Item = (K, T)>>(iter: I) -> Self {
        let mut out: Vec<(String, T)> = Vec::new();
        for (k, v) in iter {
            let k = k.into();
            match out.iter_mut().find(|(existing, _)| *existing == k) {
                Some(slot) => slot.1 = v,
                None => out.push((k, v)),
            }
        }
        Self(out)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Ordered<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for OrderedVisitor<T> {
            type Value = Ordered<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping with string keys")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries: Vec<(String, T)> = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    if entries.iter().any(|(k, _)| *k == key) {
                        return Err(de::Error::custom(format!("duplicate key '{key}'")));
                    }
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(PhantomData))
    }
}

/// Literal per-parameter sample sequences for one variable.
pub type ParamOverrides = Ordered<Vec<f64>>;

/// `None` means "use the declared defaults".
pub type PlotConfigEntry = Option<ParamOverrides>;

/// Per-model plot section: which variables to show and how to sample them.
pub type PlotConfig = Ordered<PlotConfigEntry>;

/// The declarative model catalogue.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelsConfig {
    #[serde(default)]
    pub models: Ordered<ModelEntry>,
}

/// Instantiation spec for one model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelEntry {
    /// Factory that builds the model (see `models::Instantiator`).
    #[serde(default = "default_target")]
    pub target: String,
    /// Members in declaration order; `null` declares an Independent placeholder.
    #[serde(default)]
    pub members: Ordered<Option<MemberSpec>>,
    /// Free-form factory arguments for non-expression targets.
    #[serde(default)]
    pub args: serde_json::Value,
    #[serde(default)]
    pub plot: Option<PlotConfig>,
}

fn default_target() -> String {
    "expr".to_string()
}

impl ModelEntry {
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            members: Ordered::new(),
            args: serde_json::Value::Null,
            plot: None,
        }
    }
}

/// Body of a Dependent member.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemberSpec {
    pub expr: String,
    /// Explicit parameter order; inferred from the expression when absent.
    #[serde(default)]
    pub params: Option<Vec<String>>,
    #[serde(default)]
    pub defaults: Ordered<DomainSpec>,
    #[serde(default)]
    pub latex: Option<String>,
}

/// Unvalidated `Domain` as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DomainSpec {
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

impl DomainSpec {
    pub fn to_domain(self) -> Result<Domain, EngineError> {
        Domain::new(self.min, self.max, self.count)
    }
}

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

/// Runtime configuration of the binary, derived from CLI flags and environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_path: PathBuf,
    pub log_level: String,
    pub log_target: LogTarget,
    /// Evaluate figure rows on the rayon pool.
    pub parallel: bool,
    pub plot_width: usize,
    pub plot_height: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOGUE: &str = r#"
models:
  zeta:
    members:
      x: ~
      f:
        expr: "x^2"
        defaults:
          x: { min: 0, max: 1, count: 11 }
    plot:
      f: ~
  alpha:
    target: custom
    args: { scale: 2 }
"#;

    #[test]
    fn ordered_mapping_keeps_document_order() {
        let cfg: ModelsConfig = serde_yaml::from_str(CATALOGUE).unwrap();
        let names: Vec<&str> = cfg.models.keys().collect();
        assert_eq!(names, vec!["zeta", "alpha"]);

        let zeta = cfg.models.get("zeta").unwrap();
        assert_eq!(zeta.target, "expr");
        assert!(zeta.members.get("x").unwrap().is_none());
        let f = zeta.members.get("f").unwrap().as_ref().unwrap();
        assert_eq!(f.defaults.get("x").unwrap().count, 11);
        assert!(zeta.plot.as_ref().unwrap().get("f").unwrap().is_none());

        let alpha = cfg.models.get("alpha").unwrap();
        assert_eq!(alpha.target, "custom");
        assert_eq!(alpha.args["scale"], 2);
        assert!(alpha.plot.is_none());
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let raw = r#"{"models": {"a": {}, "a": {}}}"#;
        let err = serde_json::from_str::<ModelsConfig>(raw).unwrap_err();
        assert!(err.to_string().contains("duplicate key 'a'"));
    }

    #[test]
    fn literal_overrides_parse_from_json() {
        let raw = r#"{"models": {"m": {"plot": {"f": {"x": [0, 1, 2]}}}}}"#;
        let cfg: ModelsConfig = serde_json::from_str(raw).unwrap();
        let plot = cfg.models.get("m").unwrap().plot.as_ref().unwrap();
        let overrides = plot.get("f").unwrap().as_ref().unwrap();
        assert_eq!(overrides.get("x").unwrap(), &vec![0.0, 1.0, 2.0]);
    }
}
