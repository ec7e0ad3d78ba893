use buttress::logging::{LogConfig, LoggingError, LoggingSystem};

// Separate binary: another global subscriber is installed before ours.
#[tokio::test]
async fn test_failed_install_leaves_logging_uninitialized() {
    tracing::subscriber::set_global_default(tracing_subscriber::registry()).unwrap();

    let err = LoggingSystem::init_with_config(LogConfig::default()).await.unwrap_err();
    assert!(matches!(err, LoggingError::Subscriber(_)));
    assert!(!LoggingSystem::is_initialized());
    assert_eq!(LoggingSystem::get_config().await, None);

    let err = LoggingSystem::init_with_config(LogConfig::default()).await.unwrap_err();
    assert!(matches!(err, LoggingError::Subscriber(_)));
}
