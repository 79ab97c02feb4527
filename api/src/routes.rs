pub mod clear_session;
pub mod diagnostics;
pub mod index_route;
pub mod process_document;
