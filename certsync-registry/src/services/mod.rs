pub mod exporter;
pub mod import_parser;
pub mod importer;
pub mod sync_engine;
pub mod validator;
