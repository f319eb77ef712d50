use std::io::Write;
use std::path::Path;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 18] = [
    "LECTERN_CONFIG",
    "LECTERN_LLM_PROVIDER",
    "LECTERN_LLM_BASE_URL",
    "LECTERN_LLM_MODEL",
    "LECTERN_LLM_EMBEDDING_MODEL",
    "LECTERN_LLM_MAX_TOKENS",
    "LECTERN_LLM_MAX_RETRIES",
    "LECTERN_EMBEDDING_BACKEND",
    "LECTERN_EMBEDDING_DIMENSION",
    "LECTERN_EMBEDDING_CONCURRENCY",
    "LECTERN_CHUNK_SIZE",
    "LECTERN_CHUNK_OVERLAP",
    "LECTERN_RETRIEVAL_TOP_K",
    "LECTERN_COMPOSER_SEED",
    "LECTERN_COMPOSER_TIMEOUT",
    "LECTERN_DOCUMENT_MAX_FILE_SIZE",
    "LECTERN_OPENAI_API_KEY",
    "LECTERN_GEMINI_API_KEY",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("lectern.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

#[test]
fn defaults() {
    let config = Config::default();
    assert_eq!(config.llm.provider, ProviderKind::Gemini);
    assert_eq!(config.llm.model, "gemini-2.0-flash");
    assert_eq!(config.llm.max_retries, 3);
    assert_eq!(config.embedding.backend, EmbeddingBackend::Hash);
    assert_eq!(config.embedding.dimension, 384);
    assert_eq!(config.chunking.chunk_size, 800);
    assert_eq!(config.chunking.chunk_overlap, 150);
    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.composer.timeout_secs, 120);
    assert!(config.composer.seed.is_none());
    assert_eq!(config.document.max_file_size, 50 * 1024 * 1024);
    assert!(config.validate().is_ok());
}

#[test]
fn effective_base_url_per_provider() {
    let mut llm = LlmConfig::default();
    assert_eq!(
        llm.effective_base_url(),
        "https://generativelanguage.googleapis.com/v1beta"
    );
    llm.provider = ProviderKind::OpenAi;
    assert_eq!(llm.effective_base_url(), "https://api.openai.com/v1");
    llm.base_url = Some("http://proxy:8080/v1".into());
    assert_eq!(llm.effective_base_url(), "http://proxy:8080/v1");
}

#[test]
#[serial]
fn missing_file_uses_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
    assert_eq!(config.retrieval.top_k, 3);
    assert!(config.secrets.gemini_api_key.is_none());
}

#[test]
#[serial]
fn parse_valid_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[llm]
provider = "ollama"
base_url = "http://gpu-box:11434"
model = "llama3.2"
embedding_model = "nomic-embed-text"

[embedding]
backend = "provider"

[chunking]
chunk_size = 500
chunk_overlap = 50

[retrieval]
top_k = 5

[composer]
seed = 42
timeout_secs = 0
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.effective_base_url(), "http://gpu-box:11434");
    assert_eq!(config.llm.model, "llama3.2");
    assert_eq!(config.embedding.backend, EmbeddingBackend::Provider);
    assert_eq!(config.chunking.chunk_size, 500);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.composer.seed, Some(42));
    assert!(config.generation_timeout().is_none());
    assert_eq!(config.document.max_file_size, 50 * 1024 * 1024);
}

#[test]
#[serial]
fn invalid_toml_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[llm\nprovider = ");
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn unknown_provider_in_toml_is_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[llm]\nprovider = \"claude\"\n");
    assert!(Config::load(&path).is_err());
}

#[test]
#[serial]
fn env_overrides_file() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[retrieval]\ntop_k = 5\n");

    unsafe {
        std::env::set_var("LECTERN_RETRIEVAL_TOP_K", "7");
        std::env::set_var("LECTERN_LLM_PROVIDER", "OpenAI");
        std::env::set_var("LECTERN_EMBEDDING_BACKEND", "provider");
        std::env::set_var("LECTERN_COMPOSER_SEED", "9");
        std::env::set_var("LECTERN_CHUNK_SIZE", "300");
        std::env::set_var("LECTERN_CHUNK_OVERLAP", "30");
    }
    let config = Config::load(&path).unwrap();
    clear_env();

    assert_eq!(config.retrieval.top_k, 7);
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.embedding.backend, EmbeddingBackend::Provider);
    assert_eq!(config.composer.seed, Some(9));
    assert_eq!(config.splitter_config().chunk_size, 300);
    assert_eq!(config.splitter_config().chunk_overlap, 30);
}

#[test]
#[serial]
fn invalid_env_values_are_ignored() {
    clear_env();
    unsafe {
        std::env::set_var("LECTERN_RETRIEVAL_TOP_K", "many");
        std::env::set_var("LECTERN_LLM_PROVIDER", "skynet");
    }
    let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
    clear_env();

    assert_eq!(config.retrieval.top_k, 3);
    assert_eq!(config.llm.provider, ProviderKind::Gemini);
}

#[test]
#[serial]
fn secrets_come_from_env() {
    clear_env();
    unsafe {
        std::env::set_var("LECTERN_GEMINI_API_KEY", "g-key");
        std::env::set_var("LECTERN_OPENAI_API_KEY", "   ");
    }
    let config = Config::load(Path::new("/nonexistent/lectern.toml")).unwrap();
    clear_env();

    assert_eq!(
        config
            .secrets
            .api_key(ProviderKind::Gemini)
            .map(crate::secret::Secret::expose),
        Some("g-key")
    );
    assert!(config.secrets.api_key(ProviderKind::OpenAi).is_none());
    assert!(config.secrets.api_key(ProviderKind::Ollama).is_none());
}

#[test]
fn secrets_are_never_serialized() {
    let mut config = Config::default();
    config.secrets.gemini_api_key = Some(crate::secret::Secret::new("top-secret"));
    let out = toml::to_string(&config).unwrap();
    assert!(!out.contains("top-secret"));
    assert!(out.contains("[llm]"));
}

#[test]
fn validate_rejects_bad_chunking() {
    let mut config = Config::default();
    config.chunking.chunk_overlap = 800;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));

    config.chunking.chunk_size = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_zero_dimension() {
    let mut config = Config::default();
    config.embedding.dimension = 0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn config_path_resolution_order() {
    clear_env();
    assert_eq!(
        resolve_config_path(None),
        PathBuf::from("config/default.toml")
    );

    unsafe { std::env::set_var("LECTERN_CONFIG", "/etc/lectern.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/etc/lectern.toml"));
    assert_eq!(
        resolve_config_path(Some(Path::new("cli.toml"))),
        PathBuf::from("cli.toml")
    );
    clear_env();
}

#[test]
fn generation_timeout_from_secs() {
    let config = Config::default();
    assert_eq!(config.generation_timeout(), Some(Duration::from_secs(120)));
}

#[test]
fn shipped_default_file_matches_builtin_defaults() {
    let shipped: Config = toml::from_str(include_str!("../../../../config/default.toml")).unwrap();
    let builtin = Config::default();
    assert_eq!(shipped.llm.provider, builtin.llm.provider);
    assert_eq!(shipped.llm.model, builtin.llm.model);
    assert_eq!(shipped.embedding.backend, builtin.embedding.backend);
    assert_eq!(shipped.embedding.dimension, builtin.embedding.dimension);
    assert_eq!(shipped.chunking.chunk_size, builtin.chunking.chunk_size);
    assert_eq!(shipped.chunking.chunk_overlap, builtin.chunking.chunk_overlap);
    assert_eq!(shipped.retrieval.top_k, builtin.retrieval.top_k);
    assert_eq!(shipped.composer.timeout_secs, builtin.composer.timeout_secs);
    assert_eq!(shipped.document.max_file_size, builtin.document.max_file_size);
}
