pub mod health_response;
pub mod health_route;
