pub mod entities;
pub mod errors;
pub mod ports;
pub mod upload;

// Re-export the domain boundary types and ports.
pub use entities::{
    AuthSession, Cart, CartItem, OrderReceipt, PaymentRedirect, PaymentStatus, Product,
    ShippingDetails, UploadContact, UserProfile,
};
pub use errors::{ApiError, NETWORK_UNREACHABLE_MESSAGE, StorageError};
pub use ports::{Navigator, PaymentStatusSource, ProfileSource, TokenStorage};
pub use upload::{FileRejection, RejectionReason};
