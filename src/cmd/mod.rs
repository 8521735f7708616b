pub mod captions;
pub mod output;
pub mod providers;
pub mod proxy;
pub mod resolve;
