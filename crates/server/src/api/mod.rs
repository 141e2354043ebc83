pub mod audit;
pub mod captions;
pub mod channels;
pub mod handlers;
pub mod middleware;
pub mod publish;
pub mod routes;
pub mod settings;

pub use routes::create_router;
