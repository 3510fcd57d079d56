// ABOUTME: HTTP handler modules for the bootgate server.
// ABOUTME: Setup handlers are reached through the gate; export and status through the router.

pub mod export;
pub mod setup;
pub mod status;
