//! End-to-end tick scenarios against in-memory collaborators.

mod mock_api;
mod scenarios;
