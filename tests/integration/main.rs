//! Integration tests for car-harvest
//!
//! These tests use wiremock to serve listing and detail pages and run the
//! walker, the pipeline and whole runs against them end-to-end.

mod fetch_tests;
mod frontier_tests;
mod helpers;
mod pipeline_tests;
mod run_tests;
