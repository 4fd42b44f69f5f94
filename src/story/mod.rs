pub mod actor;
pub mod captions;
pub mod choreography;
pub mod scroll;
pub mod state;
