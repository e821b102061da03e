//! Integration tests for the Flickr adapter crate
//!
//! Tests run against a wiremock server standing in for the Flickr REST
//! and upload endpoints, covering album listing and creation, photo
//! transfers in both directions, and API error mapping.

mod common;
mod test_transfers;
