// src/validator/signatures.rs
//! Signature recovery for transaction and confirmation signatures
//!
//! Signatures are 65 bytes, `r || s || v`, over a keccak-256 digest. The
//! signer is identified by the last 20 bytes of the keccak-256 of its
//! uncompressed public key.

use solana_program::{keccak, secp256k1_recover::secp256k1_recover};

use crate::error_handling::ValidatorError;
use crate::transaction::{Address, INPUTS_PER_TX};

/// Length of one signature
pub const SIGNATURE_LENGTH: usize = 65;

/// Length of the signature blob of a transaction, one slot per input
pub const SIGNATURES_LENGTH: usize = SIGNATURE_LENGTH * INPUTS_PER_TX;

/// Whether every byte of the signature is zero
pub fn is_zero_signature(signature: &[u8]) -> bool {
    signature.iter().all(|byte| *byte == 0)
}

/// Split a signature blob into its per-input slots
pub fn split_signatures(signatures: &[u8]) -> Result<[&[u8]; INPUTS_PER_TX], ValidatorError> {
    if signatures.len() != SIGNATURES_LENGTH {
        return Err(ValidatorError::InvalidSignatureLength(signatures.len()));
    }

    let (first, second) = signatures.split_at(SIGNATURE_LENGTH);
    Ok([first, second])
}

/// Recover the signer address of a 65-byte signature over `message_hash`
pub fn recover_address(message_hash: &[u8; 32], signature: &[u8]) -> Result<Address, ValidatorError> {
    if signature.len() != SIGNATURE_LENGTH {
        return Err(ValidatorError::InvalidSignatureLength(signature.len()));
    }

    if is_zero_signature(signature) {
        return Err(ValidatorError::EmptySignature);
    }

    // Accept both raw and Ethereum-style (27/28) recovery ids
    let v = signature[64];
    let recovery_id = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        _ => return Err(ValidatorError::InvalidRecoveryId(v)),
    };

    let recovered = secp256k1_recover(message_hash, recovery_id, &signature[..64])
        .map_err(|_| ValidatorError::RecoveryFailed)?;

    let digest = keccak::hash(&recovered.to_bytes()).to_bytes();
    let mut address = [0u8; 20];
    address.copy_from_slice(&digest[12..]);

    Ok(Address(address))
}
