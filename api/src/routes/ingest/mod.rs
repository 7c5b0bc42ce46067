pub mod ingest_response;
pub mod ingest_route;
