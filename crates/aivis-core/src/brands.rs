use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// A tracked brand as configured in `brands.yaml`.
///
/// Immutable for the duration of a collection run; the detector and scorer
/// only ever read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    pub name: String,
    /// Alternate names matched in answer text in addition to `name`.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Words that disqualify a nearby match (e.g. "fruit" near "Apple").
    #[serde(default)]
    pub negative_terms: Vec<String>,
    /// Registrable domain owned by the brand, without scheme or path.
    /// Citations resolving to it (or a subdomain) count as primary.
    pub owned_domain: Option<String>,
    #[serde(default = "default_locale")]
    pub locale: String,
}

fn default_locale() -> String {
    "en".to_string()
}

impl BrandConfig {
    /// Generate a URL-safe slug from the brand name. Used as the stable
    /// brand identifier on mentions, scores, and stored rows.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }

    /// All searchable terms for this brand: the name plus every alias.
    #[must_use]
    pub fn search_terms(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct BrandsFile {
    pub brands: Vec<BrandConfig>,
}

/// Load and validate the brands configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_brands(path: &Path) -> Result<BrandsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::BrandsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let brands_file: BrandsFile =
        serde_yaml::from_str(&content).map_err(ConfigError::BrandsFileParse)?;

    validate_brands(&brands_file)?;

    Ok(brands_file)
}

pub(crate) fn validate_brands(brands_file: &BrandsFile) -> Result<(), ConfigError> {
    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for brand in &brands_file.brands {
        if brand.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "brand name must be non-empty".to_string(),
            ));
        }

        for alias in &brand.aliases {
            if alias.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty alias",
                    brand.name
                )));
            }
        }

        for term in &brand.negative_terms {
            if term.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' has an empty negative term",
                    brand.name
                )));
            }
        }

        if let Some(domain) = &brand.owned_domain {
            if domain.contains("://") || domain.contains('/') {
                return Err(ConfigError::Validation(format!(
                    "brand '{}' owned_domain '{}' must be a bare domain (no scheme or path)",
                    brand.name, domain
                )));
            }
        }

        let lower_name = brand.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand name: '{}'",
                brand.name
            )));
        }

        let slug = brand.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate brand slug: '{slug}' (from brand '{}')",
                brand.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brand(name: &str) -> BrandConfig {
        BrandConfig {
            name: name.to_string(),
            aliases: Vec::new(),
            negative_terms: Vec::new(),
            owned_domain: None,
            locale: "en".to_string(),
        }
    }

    #[test]
    fn slug_simple_name() {
        assert_eq!(brand("Acme Corp").slug(), "acme-corp");
    }

    #[test]
    fn slug_special_characters() {
        assert_eq!(brand("O'Reilly Media").slug(), "oreilly-media");
    }

    #[test]
    fn slug_accented_characters() {
        // Non-ASCII chars are stripped; no dash inserted between adjacent ASCII chars
        assert_eq!(brand("Café Noir").slug(), "caf-noir");
    }

    #[test]
    fn search_terms_include_name_and_aliases() {
        let mut b = brand("Acme");
        b.aliases = vec!["Acme Inc".to_string(), "ACME Corporation".to_string()];
        assert_eq!(b.search_terms(), vec!["Acme", "Acme Inc", "ACME Corporation"]);
    }

    #[test]
    fn validate_rejects_empty_name() {
        let brands_file = BrandsFile {
            brands: vec![brand("  ")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("non-empty"));
    }

    #[test]
    fn validate_rejects_empty_alias() {
        let mut b = brand("Acme");
        b.aliases = vec![String::new()];
        let brands_file = BrandsFile { brands: vec![b] };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("empty alias"));
    }

    #[test]
    fn validate_rejects_empty_negative_term() {
        let mut b = brand("Acme");
        b.negative_terms = vec!["  ".to_string()];
        let brands_file = BrandsFile { brands: vec![b] };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("empty negative term"));
    }

    #[test]
    fn validate_rejects_owned_domain_with_scheme() {
        let mut b = brand("Acme");
        b.owned_domain = Some("https://acme.com".to_string());
        let brands_file = BrandsFile { brands: vec![b] };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("bare domain"));
    }

    #[test]
    fn validate_rejects_duplicate_name() {
        let brands_file = BrandsFile {
            brands: vec![brand("Acme"), brand("acme")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("duplicate brand name"));
    }

    #[test]
    fn validate_rejects_duplicate_slug() {
        let brands_file = BrandsFile {
            brands: vec![brand("Acme Corp"), brand("Acme--Corp")],
        };
        let err = validate_brands(&brands_file).unwrap_err();
        assert!(err.to_string().contains("duplicate brand"));
    }

    #[test]
    fn validate_accepts_valid_brands() {
        let mut a = brand("Acme");
        a.owned_domain = Some("acme.com".to_string());
        a.aliases = vec!["Acme Inc".to_string()];
        a.negative_terms = vec!["acme screw".to_string()];
        let brands_file = BrandsFile {
            brands: vec![a, brand("Zen")],
        };
        assert!(validate_brands(&brands_file).is_ok());
    }

    #[test]
    fn brands_yaml_parses_with_defaults() {
        let yaml = "brands:\n  - name: Acme\n    owned_domain: acme.com\n";
        let parsed: BrandsFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(parsed.brands.len(), 1);
        assert!(parsed.brands[0].aliases.is_empty());
        assert!(parsed.brands[0].negative_terms.is_empty());
        assert_eq!(parsed.brands[0].locale, "en");
    }
}
