//! Integration tests for pricing-hub

mod api_test;
mod cache_test;
mod pipeline_test;
mod service_test;
