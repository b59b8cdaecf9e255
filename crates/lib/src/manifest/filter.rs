//! Exclude rules.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{AssetPath, BuildError};

/// A pattern marking discovered paths as non-cacheable.
///
/// Rules are matched against the normalized asset path (leading `/`, forward
/// slashes), so `/test/` also matches a top-level `test` directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExcludeRule {
  Substring {
    value: String,
    #[serde(default)]
    ignore_case: bool,
  },
  Regex {
    pattern: String,
  },
}

impl ExcludeRule {
  pub fn substring(value: impl Into<String>) -> Self {
    Self::Substring {
      value: value.into(),
      ignore_case: false,
    }
  }

  pub fn regex(pattern: impl Into<String>) -> Self {
    Self::Regex {
      pattern: pattern.into(),
    }
  }
}

#[derive(Debug, Clone)]
enum Matcher {
  Substring { needle: String, ignore_case: bool },
  Regex(Regex),
}

impl Matcher {
  fn matches(&self, path: &str) -> bool {
    match self {
      Matcher::Substring {
        needle,
        ignore_case: false,
      } => path.contains(needle.as_str()),
      Matcher::Substring {
        needle,
        ignore_case: true,
      } => path.to_lowercase().contains(needle.as_str()),
      Matcher::Regex(re) => re.is_match(path),
    }
  }
}

/// A compiled, order-independent set of exclude rules.
#[derive(Debug, Clone, Default)]
pub struct ExcludeSet {
  matchers: Vec<Matcher>,
}

impl ExcludeSet {
  pub fn compile(rules: &[ExcludeRule]) -> Result<Self, BuildError> {
    let matchers = rules
      .iter()
      .map(|rule| match rule {
        ExcludeRule::Substring { value, ignore_case } => Ok(Matcher::Substring {
          needle: if *ignore_case { value.to_lowercase() } else { value.clone() },
          ignore_case: *ignore_case,
        }),
        ExcludeRule::Regex { pattern } => Regex::new(pattern)
          .map(Matcher::Regex)
          .map_err(|source| BuildError::ExcludePattern {
            pattern: pattern.clone(),
            source,
          }),
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { matchers })
  }

  pub fn is_excluded(&self, path: &AssetPath) -> bool {
    self.matchers.iter().any(|m| m.matches(path.as_str()))
  }
}

/// Drop every path matched by `excludes`. Errors pass through untouched.
pub fn filter<'a, I>(paths: I, excludes: &'a ExcludeSet) -> impl Iterator<Item = Result<AssetPath, BuildError>> + 'a
where
  I: IntoIterator<Item = Result<AssetPath, BuildError>>,
  I::IntoIter: 'a,
{
  paths.into_iter().filter(move |item| match item {
    Ok(path) if excludes.is_excluded(path) => {
      debug!(path = %path, "excluded");
      false
    }
    _ => true,
  })
}
