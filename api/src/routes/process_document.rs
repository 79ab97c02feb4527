pub mod process_document_request;
pub mod process_document_route;
