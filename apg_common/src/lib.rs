mod money;
mod secret;
mod token;

pub mod helpers;

pub use money::{Money, MoneyError};
pub use secret::Secret;
pub use token::SecretToken;
