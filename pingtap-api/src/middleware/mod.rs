/// Tower middleware for the API server
///
/// JWT authentication lives in `pingtap_shared::auth::middleware` and is
/// wired in `app::build_router`.

pub mod security;
