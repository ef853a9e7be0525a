#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web map API server for the care map engine.
//!
//! Loads the facility CSV named by `CARE_MAP_FACILITIES` and serves the
//! query API on `BIND_ADDR:PORT`.

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let engine = care_map_server::load_engine_from_env().map_err(std::io::Error::other)?;
    let (bind_addr, port) = care_map_server::bind_from_env();

    care_map_server::run_server(engine, &bind_addr, port).await
}
