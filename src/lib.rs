pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fairsharing;
pub mod fetch;
pub mod output;
pub mod rdf;
pub mod record;
pub mod sheet;
pub mod url_resolver;
