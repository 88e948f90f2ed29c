pub mod app_state;
pub mod http;

pub use app_state::AppState;
