//! Domain models shared across routes, services, and repositories.

pub mod account;
pub mod cart;
pub mod catalog;
pub mod newsletter;
pub mod order;
pub mod session;

pub use account::{Account, AdminMarker};
pub use cart::{CartEntry, CartItem};
pub use catalog::Product;
pub use newsletter::Subscriber;
pub use order::{JobStatus, NotificationJob, Order, OrderItem};
pub use session::CurrentAccount;
