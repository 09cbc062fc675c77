//! Binary (RLP) encoding of conditionals.
//!
//! The wire shapes mirror the established format: known accounts are an
//! ordered sequence of `(address, account)` pairs, an account is either a
//! single 32-byte storage root or a sequence of `(slot, value)` pairs
//! (disambiguated by payload kind and length at decode time, an empty payload
//! being a no-op expectation), and unset bounds encode as empty strings. The
//! submission time is carried here and only here.

use crate::{KnownAccount, TransactionConditional};
use alloy_primitives::{Address, B256};
use alloy_rlp::{BufMut, Decodable, Encodable, Error, Header, EMPTY_STRING_CODE};
use std::collections::BTreeMap;

fn slots_payload_length(slots: &BTreeMap<B256, B256>) -> usize {
    slots
        .iter()
        .map(|(slot, value)| {
            let pair = slot.length() + value.length();
            Header { list: true, payload_length: pair }.length() + pair
        })
        .sum()
}

fn known_accounts_payload_length(accounts: &BTreeMap<Address, KnownAccount>) -> usize {
    accounts
        .iter()
        .map(|(address, account)| {
            let pair = address.length() + account.length();
            Header { list: true, payload_length: pair }.length() + pair
        })
        .sum()
}

fn encode_known_accounts(accounts: &BTreeMap<Address, KnownAccount>, out: &mut dyn BufMut) {
    Header { list: true, payload_length: known_accounts_payload_length(accounts) }.encode(out);
    for (address, account) in accounts {
        let pair = address.length() + account.length();
        Header { list: true, payload_length: pair }.encode(out);
        address.encode(out);
        account.encode(out);
    }
}

fn decode_known_accounts(buf: &mut &[u8]) -> alloy_rlp::Result<BTreeMap<Address, KnownAccount>> {
    let header = Header::decode(buf)?;
    if !header.list {
        return Err(Error::UnexpectedString)
    }
    if buf.len() < header.payload_length {
        return Err(Error::InputTooShort)
    }
    let (mut payload, rest) = buf.split_at(header.payload_length);
    *buf = rest;

    let mut accounts = BTreeMap::new();
    while !payload.is_empty() {
        let pair = Header::decode(&mut payload)?;
        if !pair.list {
            return Err(Error::UnexpectedString)
        }
        if payload.len() < pair.payload_length {
            return Err(Error::InputTooShort)
        }
        let (mut pair_payload, rest) = payload.split_at(pair.payload_length);
        payload = rest;

        let address = Address::decode(&mut pair_payload)?;
        let account = KnownAccount::decode(&mut pair_payload)?;
        if !pair_payload.is_empty() {
            return Err(Error::UnexpectedLength)
        }
        accounts.insert(address, account);
    }
    Ok(accounts)
}

fn encode_opt_u64(value: Option<u64>, out: &mut dyn BufMut) {
    match value {
        Some(value) => value.encode(out),
        None => out.put_u8(EMPTY_STRING_CODE),
    }
}

fn opt_u64_length(value: Option<u64>) -> usize {
    value.map_or(1, |value| value.length())
}

fn decode_opt_u64(buf: &mut &[u8]) -> alloy_rlp::Result<Option<u64>> {
    match buf.first() {
        None => Err(Error::InputTooShort),
        Some(&EMPTY_STRING_CODE) => {
            *buf = &buf[1..];
            Ok(None)
        }
        Some(_) => Ok(Some(u64::decode(buf)?)),
    }
}

impl Encodable for KnownAccount {
    fn encode(&self, out: &mut dyn BufMut) {
        match self {
            Self::StorageRoot(root) => root.encode(out),
            Self::StorageSlots(slots) => {
                Header { list: true, payload_length: slots_payload_length(slots) }.encode(out);
                for (slot, value) in slots {
                    let pair = slot.length() + value.length();
                    Header { list: true, payload_length: pair }.encode(out);
                    slot.encode(out);
                    value.encode(out);
                }
            }
        }
    }

    fn length(&self) -> usize {
        match self {
            Self::StorageRoot(root) => root.length(),
            Self::StorageSlots(slots) => {
                let payload_length = slots_payload_length(slots);
                Header { list: true, payload_length }.length() + payload_length
            }
        }
    }
}

impl Decodable for KnownAccount {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let mut peek = *buf;
        let header = Header::decode(&mut peek)?;
        if !header.list {
            // a string payload is either absent (no-op) or exactly one root
            return match header.payload_length {
                0 => {
                    *buf = peek;
                    Ok(Self::StorageSlots(BTreeMap::new()))
                }
                32 => Ok(Self::StorageRoot(B256::decode(buf)?)),
                _ => Err(Error::UnexpectedLength),
            }
        }

        let header = Header::decode(buf)?;
        if buf.len() < header.payload_length {
            return Err(Error::InputTooShort)
        }
        let (mut payload, rest) = buf.split_at(header.payload_length);
        *buf = rest;

        let mut slots = BTreeMap::new();
        while !payload.is_empty() {
            let pair = Header::decode(&mut payload)?;
            if !pair.list {
                return Err(Error::UnexpectedString)
            }
            if payload.len() < pair.payload_length {
                return Err(Error::InputTooShort)
            }
            let (mut pair_payload, rest) = payload.split_at(pair.payload_length);
            payload = rest;

            let slot = B256::decode(&mut pair_payload)?;
            let value = B256::decode(&mut pair_payload)?;
            if !pair_payload.is_empty() {
                return Err(Error::UnexpectedLength)
            }
            slots.insert(slot, value);
        }
        Ok(Self::StorageSlots(slots))
    }
}

impl TransactionConditional {
    fn rlp_payload_length(&self) -> usize {
        let known_accounts = known_accounts_payload_length(&self.known_accounts);
        Header { list: true, payload_length: known_accounts }.length() +
            known_accounts +
            opt_u64_length(self.block_number_min) +
            opt_u64_length(self.block_number_max) +
            opt_u64_length(self.timestamp_min) +
            opt_u64_length(self.timestamp_max) +
            self.submission_time.length()
    }
}

impl Encodable for TransactionConditional {
    fn encode(&self, out: &mut dyn BufMut) {
        Header { list: true, payload_length: self.rlp_payload_length() }.encode(out);
        encode_known_accounts(&self.known_accounts, out);
        encode_opt_u64(self.block_number_min, out);
        encode_opt_u64(self.block_number_max, out);
        encode_opt_u64(self.timestamp_min, out);
        encode_opt_u64(self.timestamp_max, out);
        self.submission_time.encode(out);
    }

    fn length(&self) -> usize {
        let payload_length = self.rlp_payload_length();
        Header { list: true, payload_length }.length() + payload_length
    }
}

impl Decodable for TransactionConditional {
    fn decode(buf: &mut &[u8]) -> alloy_rlp::Result<Self> {
        let header = Header::decode(buf)?;
        if !header.list {
            return Err(Error::UnexpectedString)
        }
        if buf.len() < header.payload_length {
            return Err(Error::InputTooShort)
        }
        let (mut payload, rest) = buf.split_at(header.payload_length);
        *buf = rest;

        let cond = Self {
            known_accounts: decode_known_accounts(&mut payload)?,
            block_number_min: decode_opt_u64(&mut payload)?,
            block_number_max: decode_opt_u64(&mut payload)?,
            timestamp_min: decode_opt_u64(&mut payload)?,
            timestamp_max: decode_opt_u64(&mut payload)?,
            submission_time: u64::decode(&mut payload)?,
        };
        if !payload.is_empty() {
            return Err(Error::UnexpectedLength)
        }
        Ok(cond)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(cond: &TransactionConditional) -> TransactionConditional {
        let mut out = Vec::new();
        cond.encode(&mut out);
        assert_eq!(out.len(), cond.length());
        let mut buf = out.as_slice();
        let decoded = TransactionConditional::decode(&mut buf).unwrap();
        assert!(buf.is_empty());
        decoded
    }

    #[test]
    fn rlp_round_trip_empty() {
        let cond = TransactionConditional::default();
        assert_eq!(round_trip(&cond), cond);
    }

    #[test]
    fn rlp_round_trip_full() {
        let slots: BTreeMap<_, _> = [
            (B256::with_last_byte(1), B256::with_last_byte(2)),
            (B256::with_last_byte(3), B256::repeat_byte(0xff)),
        ]
        .into_iter()
        .collect();
        let known_accounts: BTreeMap<_, _> = [
            (Address::repeat_byte(1), KnownAccount::StorageRoot(B256::repeat_byte(7))),
            (Address::repeat_byte(2), KnownAccount::StorageSlots(slots)),
        ]
        .into_iter()
        .collect();

        let cond = TransactionConditional {
            known_accounts,
            block_number_min: Some(1),
            block_number_max: Some(u64::MAX),
            timestamp_min: None,
            timestamp_max: Some(1_700_000_000),
            submission_time: 1_699_999_000,
        };
        // the binary form carries the submission time, unlike JSON
        assert_eq!(round_trip(&cond), cond);
    }

    #[test]
    fn rlp_unset_bounds_decode_as_none() {
        let cond = TransactionConditional {
            block_number_max: Some(42),
            ..Default::default()
        };
        let decoded = round_trip(&cond);
        assert_eq!(decoded.block_number_min, None);
        assert_eq!(decoded.block_number_max, Some(42));
        assert_eq!(decoded.timestamp_min, None);
        assert_eq!(decoded.timestamp_max, None);
    }

    #[test]
    fn rlp_known_account_root_vs_slots() {
        let root = KnownAccount::StorageRoot(B256::repeat_byte(9));
        let mut out = Vec::new();
        root.encode(&mut out);
        // 32-byte string payload
        assert_eq!(out[0], 0xa0);
        assert_eq!(KnownAccount::decode(&mut out.as_slice()).unwrap(), root);

        let slots = KnownAccount::StorageSlots(
            [(B256::with_last_byte(1), B256::with_last_byte(2))].into_iter().collect(),
        );
        let mut out = Vec::new();
        slots.encode(&mut out);
        assert_eq!(out.len(), slots.length());
        assert_eq!(KnownAccount::decode(&mut out.as_slice()).unwrap(), slots);
    }

    #[test]
    fn rlp_known_account_empty_payload_is_noop() {
        let buf = [EMPTY_STRING_CODE];
        let decoded = KnownAccount::decode(&mut buf.as_slice()).unwrap();
        assert_eq!(decoded, KnownAccount::StorageSlots(BTreeMap::new()));
    }

    #[test]
    fn rlp_rejects_malformed_root_length() {
        // a 31-byte string is neither a root nor a slot list
        let mut buf = vec![0x80 + 31];
        buf.extend_from_slice(&[0u8; 31]);
        assert_eq!(KnownAccount::decode(&mut buf.as_slice()), Err(Error::UnexpectedLength));
    }

    #[test]
    fn rlp_rejects_trailing_bytes() {
        let cond = TransactionConditional::default();
        let mut out = Vec::new();
        // re-encode with an inflated payload length claim
        let payload = {
            let mut inner = Vec::new();
            encode_known_accounts(&cond.known_accounts, &mut inner);
            for _ in 0..4 {
                inner.push(EMPTY_STRING_CODE);
            }
            0u64.encode(&mut inner);
            inner.push(0x01); // trailing garbage inside the list payload
            inner
        };
        Header { list: true, payload_length: payload.len() }.encode(&mut out);
        out.extend_from_slice(&payload);
        assert_eq!(TransactionConditional::decode(&mut out.as_slice()), Err(Error::UnexpectedLength));
    }
}
