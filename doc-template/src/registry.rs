//! The template registry and its process-wide instance.

use crate::{common::*, DataField, SecurityFeature, Template, TemplateError};

static GLOBAL_REGISTRY: OnceCell<TemplateRegistry> = OnceCell::new();

/// The collection of document templates indexed by document type.
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: IndexMap<String, Template>,
}

impl TemplateRegistry {
    /// Load every `*.json` template in `dir`.
    ///
    /// A missing directory yields an empty registry. Files that fail to load
    /// are reported and skipped.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();

        if !dir.is_dir() {
            warn!("template directory not found: '{}'", dir.display());
            return Self::default();
        }

        let paths = match template_files(dir) {
            Ok(paths) => paths,
            Err(err) => {
                error!(
                    "unable to list templates in '{}': {:#}",
                    dir.display(),
                    err
                );
                return Self::default();
            }
        };

        let templates = paths.into_iter().filter_map(|path| {
            match Template::open(&path) {
                Ok(template) => {
                    info!("loaded template: {}", template.document_type);
                    Some(template)
                }
                Err(err) => {
                    error!("failed to load '{}': {:#}", path.display(), err);
                    None
                }
            }
        });

        Self::from_templates(templates)
    }

    /// Build a registry from templates. A later template replaces an earlier
    /// one of the same document type.
    pub fn from_templates(templates: impl IntoIterator<Item = Template>) -> Self {
        let mut registry = Self::default();

        templates.into_iter().for_each(|template| {
            let document_type = template.document_type.clone();
            if registry
                .templates
                .insert(document_type.clone(), template)
                .is_some()
            {
                warn!("template '{}' is defined more than once", document_type);
            }
        });

        registry
    }

    /// Initialize the process-wide registry from `dir`.
    ///
    /// It can be initialized only once and is read-only afterwards.
    pub fn init_global(dir: impl AsRef<Path>) -> Result<&'static Self, TemplateError> {
        let registry = Self::load(dir);
        GLOBAL_REGISTRY
            .set(registry)
            .map_err(|_| TemplateError::AlreadyInitialized)?;
        Self::global()
    }

    /// Get the process-wide registry.
    pub fn global() -> Result<&'static Self, TemplateError> {
        GLOBAL_REGISTRY.get().ok_or(TemplateError::Uninitialized)
    }

    pub fn template(&self, document_type: &str) -> Result<&Template, TemplateError> {
        self.templates
            .get(document_type)
            .ok_or_else(|| TemplateError::InvalidDocumentType {
                document_type: document_type.to_owned(),
            })
    }

    pub fn security_features(
        &self,
        document_type: &str,
    ) -> Result<&IndexMap<String, SecurityFeature>, TemplateError> {
        Ok(&self.template(document_type)?.security_features)
    }

    pub fn data_fields(
        &self,
        document_type: &str,
    ) -> Result<&IndexMap<String, DataField>, TemplateError> {
        Ok(&self.template(document_type)?.data_fields)
    }

    pub fn forgery_indicators(&self, document_type: &str) -> Result<&[String], TemplateError> {
        Ok(&self.template(document_type)?.forgery_indicators)
    }

    pub fn validation_rules(
        &self,
        document_type: &str,
    ) -> Result<&IndexMap<String, Value>, TemplateError> {
        Ok(&self.template(document_type)?.validation_rules)
    }

    /// The registered document types in sorted order.
    pub fn document_types(&self) -> Vec<&str> {
        self.templates.keys().map(String::as_str).sorted().collect()
    }

    pub fn contains(&self, document_type: &str) -> bool {
        self.templates.contains_key(document_type)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// List `*.json` files in `dir` sorted by path.
fn template_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = dir
        .to_str()
        .ok_or_else(|| format_err!("non-UTF-8 directory name '{}'", dir.display()))?;
    let pattern = format!("{}/*.json", glob::Pattern::escape(dir));
    let paths: Vec<_> = glob::glob(&pattern)?.collect::<Result<_, _>>()?;
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(document_type: &str) -> Template {
        serde_json::from_value(serde_json::json!({ "document_type": document_type })).unwrap()
    }

    #[test]
    fn unknown_document_type() {
        let registry = TemplateRegistry::from_templates(vec![template("kenyan_national_id")]);
        let err = registry.template("passport_v2").unwrap_err();
        assert!(matches!(
            err,
            TemplateError::InvalidDocumentType { ref document_type } if document_type == "passport_v2"
        ));
        assert!(registry.data_fields("passport_v2").is_err());
    }

    #[test]
    fn later_template_replaces_earlier() {
        let mut replacement = template("kcse_certificate");
        replacement.forgery_indicators = vec!["wrong seal".into()];
        let registry =
            TemplateRegistry::from_templates(vec![template("kcse_certificate"), replacement]);

        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.forgery_indicators("kcse_certificate").unwrap(),
            ["wrong seal".to_string()]
        );
    }

    #[test]
    fn document_types_are_sorted() {
        let registry = TemplateRegistry::from_templates(vec![
            template("passport"),
            template("kenyan_national_id"),
            template("kcse_certificate"),
        ]);
        assert_eq!(
            registry.document_types(),
            vec!["kcse_certificate", "kenyan_national_id", "passport"]
        );
    }

    #[test]
    fn missing_directory_is_empty() {
        let registry = TemplateRegistry::load("/nonexistent/templates");
        assert!(registry.is_empty());
    }
}
