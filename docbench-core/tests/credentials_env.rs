use docbench_core::catalog::{api_key_variable, availability, plan_tasks, Credentials, ProviderCatalog};
use docbench_core::error::PipelineError;
use serial_test::serial;
use std::env;

fn clear_provider_keys(catalog: &ProviderCatalog) {
    for provider in catalog.providers() {
        env::remove_var(api_key_variable(&provider.name));
    }
}

#[test]
#[serial]
fn test_credentials_read_provider_keys_from_environment() {
    let catalog = ProviderCatalog::builtin();
    clear_provider_keys(&catalog);
    env::set_var("GROQ_API_KEY", "gsk-test");
    env::set_var("OPENAI_API_KEY", "   ");

    let credentials = Credentials::from_env(&catalog);
    assert!(credentials.is_available("groq"));
    assert!(!credentials.is_available("openai"));
    assert!(!format!("{credentials:?}").contains("gsk-test"));

    let listed = availability(&catalog, &credentials);
    assert_eq!(listed.len(), catalog.providers().len());
    assert_eq!(listed.iter().filter(|p| p.available).count(), 1);

    let tasks = plan_tasks(&catalog, &credentials, None).unwrap();
    assert!(tasks.iter().all(|t| t.provider_name == "groq"));
    assert_eq!(tasks.len(), catalog.get("groq").unwrap().models.len());

    clear_provider_keys(&catalog);
}

#[test]
#[serial]
fn test_known_but_uncredentialed_provider_has_nothing_to_run() {
    let catalog = ProviderCatalog::builtin();
    clear_provider_keys(&catalog);
    env::set_var("GROQ_API_KEY", "gsk-test");

    let credentials = Credentials::from_env(&catalog);
    let err = plan_tasks(&catalog, &credentials, Some("mistral")).unwrap_err();
    assert!(matches!(err, PipelineError::NoProvidersAvailable));

    clear_provider_keys(&catalog);
}
