pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use domain::{ApiError, AuthSession, Cart, PaymentStatus, Product, UserProfile};
pub use frameworks::app::{build_state, build_state_with_storage};
pub use frameworks::config::Config;
pub use interface_adapters::events::{AuthEvents, AuthSubscription};
pub use interface_adapters::gateway::{ApiGateway, ApiRequest, RequestOptions, UnauthorizedPolicy};
pub use interface_adapters::session::SessionStore;
pub use interface_adapters::state::AppState;
