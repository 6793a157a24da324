//! Run configuration. Deserialized from a JSON document with `serde_json`.
//! Falls back to `Config::default()` and writes it back out when no file is
//! present, so a first run always leaves behind an editable `cfg.json`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// A distribution specifier for drawing a hyperparameter's initial value.
/// Serialized as a JSON array whose first element is the distribution tag
/// (e.g. `["unilog", 3, 6]`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(into = "Vec<DistToken>")]
pub enum DistSpec {
    Uniform { lo: f64, hi: f64 },
    /// `10^U(lo,hi)`.
    Unilog { lo: f64, hi: f64 },
    Normal { mu: f64, sigma: f64 },
    /// sigmoid of `U(logit(lo), logit(hi))`.
    Expit { lo: f64, hi: f64 },
    Const { value: f64 },
}

/// Helper for round-tripping `DistSpec` through a tagged JSON array without
/// hand-writing a `Visitor`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum DistToken {
    Tag(String),
    Number(f64),
}

impl From<DistSpec> for Vec<DistToken> {
    fn from(spec: DistSpec) -> Self {
        match spec {
            DistSpec::Uniform { lo, hi } => vec![
                DistToken::Tag("uniform".into()),
                DistToken::Number(lo),
                DistToken::Number(hi),
            ],
            DistSpec::Unilog { lo, hi } => vec![
                DistToken::Tag("unilog".into()),
                DistToken::Number(lo),
                DistToken::Number(hi),
            ],
            DistSpec::Normal { mu, sigma } => vec![
                DistToken::Tag("normal".into()),
                DistToken::Number(mu),
                DistToken::Number(sigma),
            ],
            DistSpec::Expit { lo, hi } => vec![
                DistToken::Tag("expit".into()),
                DistToken::Number(lo),
                DistToken::Number(hi),
            ],
            DistSpec::Const { value } => {
                vec![DistToken::Tag("const".into()), DistToken::Number(value)]
            }
        }
    }
}

impl<'de> Deserialize<'de> for DistSpec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let tokens = Vec::<DistToken>::deserialize(deserializer)?;
        let tag = match tokens.first() {
            Some(DistToken::Tag(t)) => t.as_str(),
            _ => return Err(serde::de::Error::custom("distribution specifier missing tag")),
        };
        let num = |i: usize| -> Result<f64, D::Error> {
            match tokens.get(i) {
                Some(DistToken::Number(n)) => Ok(*n),
                _ => Err(serde::de::Error::custom(format!(
                    "distribution specifier missing numeric argument {i}"
                ))),
            }
        };
        match tag {
            "uniform" => Ok(DistSpec::Uniform { lo: num(1)?, hi: num(2)? }),
            "unilog" => Ok(DistSpec::Unilog { lo: num(1)?, hi: num(2)? }),
            "normal" => Ok(DistSpec::Normal { mu: num(1)?, sigma: num(2)? }),
            "expit" => Ok(DistSpec::Expit { lo: num(1)?, hi: num(2)? }),
            "const" => Ok(DistSpec::Const { value: num(1)? }),
            other => Err(serde::de::Error::custom(format!(
                "unknown distribution tag {other:?}"
            ))),
        }
    }
}

impl DistSpec {
    /// Draw one sample in this worker's own PRNG context (never a value
    /// passed in from the parent).
    pub fn sample(&self, rng: &mut impl rand::Rng) -> f64 {
        match *self {
            DistSpec::Uniform { lo, hi } => rng.random_range(lo..=hi),
            DistSpec::Unilog { lo, hi } => 10f64.powf(rng.random_range(lo..=hi)),
            DistSpec::Normal { mu, sigma } => {
                // Box-Muller; keeps this module free of a `rand_distr` dependency.
                let u1: f64 = rng.random_range(f64::EPSILON..1.0);
                let u2: f64 = rng.random();
                let z0 = (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos();
                mu + sigma * z0
            }
            DistSpec::Expit { lo, hi } => {
                let logit = |p: f64| (p / (1.0 - p)).ln();
                let expit = |x: f64| 1.0 / (1.0 + (-x).exp());
                expit(rng.random_range(logit(lo)..=logit(hi)))
            }
            DistSpec::Const { value } => value,
        }
    }
}

/// Which selection policy the coordinator runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    Welch,
    Velo,
    Trunc,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionConfig {
    pub subr: Policy,
    pub p: f64,
    pub trunc: f64,
    pub inactiv: u64,
    #[serde(rename = "n_protected")]
    pub n_protected: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub time_limit: f64,
    pub n_workers: usize,
    pub baseline: bool,
    pub filename: String,
    pub inits: BTreeMap<String, DistSpec>,
    pub scales: BTreeMap<String, f64>,
    pub selection: SelectionConfig,
    pub horizon: usize,
    /// derived from `filename`'s stem when left blank in the config file.
    #[serde(default)]
    pub instance: String,
}

impl Config {
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => {
                let mut cfg: Config = serde_json::from_str(&text)
                    .with_context(|| format!("parsing config file {}", path.display()))?;
                cfg.fill_instance_name();
                cfg.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                log::info!(
                    "no config file at {}, writing defaults",
                    path.display()
                );
                let mut cfg = Config::default();
                cfg.fill_instance_name();
                let text = serde_json::to_string_pretty(&cfg)
                    .context("serializing default config")?;
                std::fs::write(path, text)
                    .with_context(|| format!("writing default config to {}", path.display()))?;
                Ok(cfg)
            }
        }
    }

    fn fill_instance_name(&mut self) {
        if self.instance.is_empty() {
            self.instance = Path::new(&self.filename)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.filename.clone());
        }
    }

    /// Configuration errors are fatal at startup: unknown distribution tags
    /// and unknown selection policies are already caught by serde during
    /// deserialization (they fail to parse); this catches the remaining
    /// class, negative explore scales.
    fn validate(&self) -> Result<()> {
        for (name, scale) in &self.scales {
            if *scale < 0.0 {
                anyhow::bail!("negative explore scale for {name:?}: {scale}");
            }
        }
        if self.n_workers == 0 {
            anyhow::bail!("n_workers must be at least 1");
        }
        if self.horizon == 0 {
            anyhow::bail!("horizon must be at least 1");
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut inits = BTreeMap::new();
        inits.insert("temperature".into(), DistSpec::Unilog { lo: 3.0, hi: 6.0 });
        inits.insert(
            "cooling_rate".into(),
            DistSpec::Unilog { lo: -4.0, hi: -2.0 },
        );
        inits.insert(
            "p_mutations".into(),
            DistSpec::Expit { lo: 0.01, hi: 0.99 },
        );

        let mut scales = BTreeMap::new();
        scales.insert("temperature".into(), 0.05);
        scales.insert("cooling_rate".into(), 0.05);
        scales.insert("p_mutations".into(), 0.05);

        Config {
            time_limit: 10.0,
            n_workers: 50,
            baseline: false,
            filename: "./data/sac94/weing/weing8.dat".into(),
            inits,
            scales,
            selection: SelectionConfig {
                subr: Policy::Velo,
                p: 0.01,
                trunc: 0.05,
                inactiv: 50,
                n_protected: 50,
            },
            horizon: 50,
            instance: String::new(),
        }
    }
}
