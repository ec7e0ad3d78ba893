pub mod schema_test_data;
