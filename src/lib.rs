#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Task management backend with a stateless JWT authentication layer:"]
#![doc = "token issuance and verification, refresh-token rotation, per-request"]
#![doc = "principal injection, and role/ownership access control over tasks."]
#![doc = "The main binary (`main.rs`) wires these modules into an actix-web app."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod storage;
