use super::*;
use crate::constants::{DEFAULT_EMBEDDING_DIM, MAX_EMBED_CHARS};
use std::path::PathBuf;

mod config_tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = EmbedderConfig::default();
        assert_eq!(config.embedding_dim, DEFAULT_EMBEDDING_DIM);
        assert!(config.model_dir.is_none());
        assert!(!config.testing_stub);
    }

    #[test]
    fn test_config_stub_validates() {
        assert!(EmbedderConfig::stub().validate().is_ok());
    }

    #[test]
    fn test_config_without_model_dir_fails() {
        let result = EmbedderConfig::default().validate();
        assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));
    }

    #[test]
    fn test_config_missing_files_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let result = EmbedderConfig::new(dir.path()).validate();

        match result {
            Err(EmbeddingError::ModelNotFound { path }) => {
                assert_eq!(path, dir.path().join("config.json"));
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_config_zero_dim_rejected() {
        let result = EmbedderConfig::stub().embedding_dim(0).validate();
        assert!(matches!(result, Err(EmbeddingError::InvalidConfig { .. })));
    }

    #[test]
    fn test_load_nonexistent_model_dir() {
        let config = EmbedderConfig::new(PathBuf::from("/nonexistent/bge-small"));
        assert!(BertEmbedder::load(config).is_err());
    }
}

mod stub_tests {
    use super::*;

    #[test]
    fn test_stub_dimension() {
        let embedder = BertEmbedder::stub();
        let embedding = embedder.embed("Senior backend engineer").unwrap();
        assert_eq!(embedding.len(), DEFAULT_EMBEDDING_DIM);
        assert_eq!(embedder.embedding_dim(), DEFAULT_EMBEDDING_DIM);
        assert!(embedder.is_stub());
    }

    #[test]
    fn test_stub_custom_dimension() {
        let embedder = BertEmbedder::load(EmbedderConfig::stub().embedding_dim(16)).unwrap();
        assert_eq!(embedder.embed("hello").unwrap().len(), 16);
    }

    #[test]
    fn test_stub_is_deterministic() {
        let embedder = BertEmbedder::stub();
        let a = embedder.embed("case study requirements").unwrap();
        let b = embedder.embed("case study requirements").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_stub_differs_per_text() {
        let embedder = BertEmbedder::stub();
        let a = embedder.embed("cv rubric").unwrap();
        let b = embedder.embed("project rubric").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_stub_is_normalized() {
        let embedder = BertEmbedder::stub();
        let embedding = embedder.embed("normalize me").unwrap();
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_empty_text_rejected() {
        let embedder = BertEmbedder::stub();
        assert!(matches!(embedder.embed(""), Err(EmbeddingError::EmptyInput)));
        assert!(matches!(
            embedder.embed("   \n\t"),
            Err(EmbeddingError::EmptyInput)
        ));
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        let embedder = BertEmbedder::stub();
        assert_eq!(
            embedder.embed("  rubric  ").unwrap(),
            embedder.embed("rubric").unwrap()
        );
    }
}

mod prepare_input_tests {
    use super::*;

    #[test]
    fn test_short_text_borrowed() {
        let prepared = prepare_input("short text").unwrap();
        assert!(matches!(prepared, std::borrow::Cow::Borrowed("short text")));
    }

    #[test]
    fn test_long_text_truncated_with_ellipsis() {
        let text = "a".repeat(MAX_EMBED_CHARS + 500);
        let prepared = prepare_input(&text).unwrap();
        assert_eq!(prepared.chars().count(), MAX_EMBED_CHARS + 3);
        assert!(prepared.ends_with("..."));
    }

    #[test]
    fn test_exact_limit_untouched() {
        let text = "b".repeat(MAX_EMBED_CHARS);
        let prepared = prepare_input(&text).unwrap();
        assert_eq!(prepared.len(), MAX_EMBED_CHARS);
    }

    #[test]
    fn test_truncation_respects_char_boundaries() {
        let text = "é".repeat(MAX_EMBED_CHARS + 10);
        let prepared = prepare_input(&text).unwrap();
        assert_eq!(prepared.chars().count(), MAX_EMBED_CHARS + 3);
    }
}
