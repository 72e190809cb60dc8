use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().nest("/collections", collection_routes())
}

fn collection_routes() -> OpenApiRouter<AppState> {
    let read = OpenApiRouter::new()
        .routes(routes!(handlers::collection::list_collections))
        .routes(routes!(handlers::collection::get_collection))
        .routes(routes!(handlers::collection::list_collection_files));

    let import = OpenApiRouter::new()
        .routes(routes!(handlers::collection::import_archive))
        .layer(handlers::collection::import_body_limit());

    read.merge(import)
}
