pub mod account;
pub mod auth_state;
pub mod catalog;
pub mod checkout;
pub mod custom_files;

#[cfg(test)]
pub(crate) mod test_support;
