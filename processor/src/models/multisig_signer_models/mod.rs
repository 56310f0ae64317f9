pub mod multisig_signer;
