pub mod multisig_transaction;
pub mod transaction_classifier;
