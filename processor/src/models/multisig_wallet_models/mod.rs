pub mod multisig_wallet;
