use doc_template::{TemplateError, TemplateRegistry};
use std::path::Path;

#[test]
fn global_registry_is_initialized_once() {
    assert!(matches!(
        TemplateRegistry::global(),
        Err(TemplateError::Uninitialized)
    ));

    let dir = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("templates");
    let registry = TemplateRegistry::init_global(&dir).unwrap();
    assert!(registry.contains("kenyan_national_id"));

    let again = TemplateRegistry::init_global(&dir);
    assert!(matches!(again, Err(TemplateError::AlreadyInitialized)));

    let global = TemplateRegistry::global().unwrap();
    assert_eq!(global.len(), registry.len());
}
