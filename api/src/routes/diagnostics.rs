pub mod debug_info_route;
pub mod test_cache_route;
