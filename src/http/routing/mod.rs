pub use super::routes::todos;

use axum::Router;
use ::http::{HeaderValue, Method};
use tower::ServiceBuilder;
use tower_http::{cors::{AllowHeaders, AllowOrigin, CorsLayer}, trace::TraceLayer};

/// Wraps the API routes with request tracing and a CORS policy admitting a single origin.
pub fn app(router: Router, allowed_origin: HeaderValue) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors(allowed_origin)),
    )
}

fn cors(allowed_origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin]))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(AllowHeaders::mirror_request())
}
