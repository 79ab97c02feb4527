pub mod clear_session_request;
pub mod clear_session_route;
