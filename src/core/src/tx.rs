//! Transaction construction and content-addressed ids.

use byteorder::{BigEndian, ByteOrder};
use sha2::{Digest, Sha256};

use crate::errors::LedgerError;
use crate::types::{AccountRef, Amount, Transaction, TxId};

/// Domain tag prefixed to every canonical transaction encoding.
const DOMAIN_TAG: &[u8] = b"mintledger.tx";

/// Version of the canonical encoding. Bump when the layout changes.
pub const CANONICAL_VERSION: u8 = 1;

fn push_account(buf: &mut Vec<u8>, account: &AccountRef) {
    buf.push(account.kind.tag());
    let mut id_bytes = [0u8; 8];
    BigEndian::write_i64(&mut id_bytes, account.id);
    buf.extend_from_slice(&id_bytes);
}

/// Canonical pre-hash bytes of a transaction.
///
/// Layout: domain tag, version byte, `from` (kind tag, i64 id), `to` (kind
/// tag, i64 id), u32 length-prefixed timestamp, u64 amount. All integers are
/// big-endian, so no two distinct field tuples share an encoding.
pub fn canonical_bytes(
    from: &AccountRef,
    to: &AccountRef,
    timestamp: &str,
    number: Amount,
) -> Result<Vec<u8>, LedgerError> {
    let timestamp_len = u32::try_from(timestamp.len())
        .map_err(|_| LedgerError::InvalidParams("timestamp too long".to_string()))?;

    let mut buf = Vec::with_capacity(DOMAIN_TAG.len() + 1 + 9 + 9 + 4 + timestamp.len() + 8);
    buf.extend_from_slice(DOMAIN_TAG);
    buf.push(CANONICAL_VERSION);
    push_account(&mut buf, from);
    push_account(&mut buf, to);

    let mut len_bytes = [0u8; 4];
    BigEndian::write_u32(&mut len_bytes, timestamp_len);
    buf.extend_from_slice(&len_bytes);
    buf.extend_from_slice(timestamp.as_bytes());

    let mut number_bytes = [0u8; 8];
    BigEndian::write_u64(&mut number_bytes, number);
    buf.extend_from_slice(&number_bytes);

    Ok(buf)
}

/// Hashes canonical bytes into a transaction id.
pub fn hash(bytes: &[u8]) -> TxId {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Builds a transaction record with its id filled in. Nothing is persisted.
pub fn build(
    from: AccountRef,
    to: AccountRef,
    timestamp: impl Into<String>,
    number: Amount,
) -> Result<Transaction, LedgerError> {
    let timestamp = timestamp.into();
    let id = hash(&canonical_bytes(&from, &to, &timestamp, number)?);
    Ok(Transaction {
        id,
        from,
        to,
        timestamp,
        number,
    })
}

/// Recomputes the id of `tx` and checks it matches.
pub fn verify(tx: &Transaction) -> Result<bool, LedgerError> {
    let expected = hash(&canonical_bytes(&tx.from, &tx.to, &tx.timestamp, tx.number)?);
    Ok(expected == tx.id)
}
