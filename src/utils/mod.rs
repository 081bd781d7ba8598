pub mod secret_token;

pub use secret_token::SecretToken;
