//! End-to-end tests against a local mock HTTP server

mod crawl_tests;
