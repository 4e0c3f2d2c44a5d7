//! The template document format.

use crate::common::*;

/// The description of one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    /// Defaults to the file stem when loaded from a file without this key.
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub security_features: IndexMap<String, SecurityFeature>,
    #[serde(default)]
    pub data_fields: IndexMap<String, DataField>,
    #[serde(default)]
    pub forgery_indicators: Vec<String>,
    #[serde(default)]
    pub validation_rules: IndexMap<String, Value>,
    /// Keys the toolkit does not interpret.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A security feature printed on the document, such as a hologram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityFeature {
    #[serde(default)]
    pub priority: Option<Value>,
    #[serde(default)]
    pub region: Option<RatioRegion>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// A printed data field, such as the name or the ID number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataField {
    #[serde(default)]
    pub format_regex: Option<String>,
    #[serde(default)]
    pub region: Option<RatioRegion>,
    /// Whether the field holds personal data that must be anonymized.
    #[serde(default)]
    pub sensitive: bool,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Template {
    /// Load a template from a JSON file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut template: Self = serde_json::from_str(&text)?;

        if template.document_type.is_empty() {
            template.document_type = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| format_err!("invalid template file name '{}'", path.display()))?
                .to_owned();
        }

        template.validate()?;
        Ok(template)
    }

    pub fn validate(&self) -> Result<()> {
        self.data_fields
            .iter()
            .filter_map(|(name, field)| Some((name, field.region.as_ref()?)))
            .chain(
                self.security_features
                    .iter()
                    .filter_map(|(name, feature)| Some((name, feature.region.as_ref()?))),
            )
            .try_for_each(|(name, region)| {
                region
                    .validate()
                    .with_context(|| format!("invalid region for '{}'", name))
            })?;

        self.data_fields
            .iter()
            .filter_map(|(name, field)| Some((name, field.format_regex.as_ref()?)))
            .try_for_each(|(name, pattern)| -> Result<_> {
                Regex::new(pattern)
                    .with_context(|| format!("invalid format_regex for field '{}'", name))?;
                Ok(())
            })?;

        Ok(())
    }

    /// Regions of personal data to hide before the image leaves the
    /// collection site.
    ///
    /// Fields flagged `sensitive` are returned. If no field carries the flag,
    /// every field with a region is considered sensitive.
    pub fn sensitive_regions(&self) -> Vec<(&str, RatioRegion)> {
        let with_region = || {
            self.data_fields
                .iter()
                .filter_map(|(name, field)| Some((name.as_str(), field, field.region?)))
        };
        let any_flagged = with_region().any(|(_, field, _)| field.sensitive);

        with_region()
            .filter(|(_, field, _)| !any_flagged || field.sensitive)
            .map(|(name, _, region)| (name, region))
            .collect()
    }

    /// Check a transcribed value against the field's `format_regex`.
    ///
    /// Fields without a pattern accept any value.
    pub fn check_field(&self, field: &str, value: &str) -> Result<bool> {
        let data_field = self.data_fields.get(field).ok_or_else(|| {
            crate::TemplateError::UnknownField {
                document_type: self.document_type.clone(),
                field: field.to_owned(),
            }
        })?;

        match &data_field.format_regex {
            Some(pattern) => Ok(Regex::new(pattern)?.is_match(value)),
            None => Ok(true),
        }
    }
}
