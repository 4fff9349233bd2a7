//! HTTP-level integration tests over in-memory stores and a temp-dir
//! local storage root.

mod helpers;

mod analytics_test;
mod auth_test;
mod file_test;
mod folder_test;
mod share_test;
