use buttress::logging::{LogConfig, LoggingError, LoggingSystem};

// One test per binary: the subscriber is process-global.
#[tokio::test]
async fn test_logging_initializes_once() {
    assert!(!LoggingSystem::is_initialized());

    let mut config = LogConfig::default();
    config.console.enabled = false;
    config.general.default_level = "DEBUG".to_string();
    LoggingSystem::init_with_config(config.clone()).await.unwrap();

    assert!(LoggingSystem::is_initialized());
    assert_eq!(LoggingSystem::get_config().await, Some(config));

    let err = LoggingSystem::init_default().await.unwrap_err();
    assert!(matches!(err, LoggingError::AlreadyInitialized));
}
