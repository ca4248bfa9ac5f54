//! The `BtcLightMirror` wire payload and the byte-reversal rule (spec.md
//! §4.C, §6). The exact mirror serialization ("byte-exact format... defined
//! by the external `btcpowermirror.lightmirror` serializer") is an external
//! collaborator out of scope for this core per spec.md §1; what this module
//! owns is assembling the three inputs in the original's order
//! (`executor/mirror_converter.go::NewBtcLightMirror`) and the
//! display-order/on-wire-order conversion the Gateway applies at every
//! contract boundary (`executor/utils.go::RevertHash`).

use super::api::Hash32;
use crate::btc::chain::BtcBlock;

/// The three inputs `syncBtcHeader` is ultimately built from: the raw
/// 80-byte block header, the full coinbase transaction, and every
/// transaction hash in the block's canonical order.
pub struct BtcLightMirror {
    pub header_bytes: [u8; 80],
    pub coinbase_tx_bytes: Vec<u8>,
    pub tx_hashes: Vec<Hash32>,
}

impl BtcLightMirror {
    /// Assembles the mirror payload from a full block, mirroring
    /// `NewBtcLightMirror`'s `(header, txs[0], fillTxHashes(txs))` shape.
    pub fn from_block(block: &BtcBlock) -> Self {
        use bitcoincore_rpc_async::bitcoin::consensus::encode::serialize;
        use bitcoincore_rpc_async::bitcoin::hashes::Hash;

        let header_bytes: [u8; 80] = serialize(&block.header)
            .try_into()
            .expect("bitcoin block headers are always 80 bytes");
        let coinbase_tx_bytes = block
            .txdata
            .first()
            .map(serialize)
            .unwrap_or_default();
        let tx_hashes = block
            .txdata
            .iter()
            .map(|tx| tx.txid().to_byte_array())
            .collect();

        Self {
            header_bytes,
            coinbase_tx_bytes,
            tx_hashes,
        }
    }

    /// Serializes to the wire format expected by `syncBtcHeader`: header,
    /// then coinbase tx, then every tx hash concatenated in order.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            self.header_bytes.len() + self.coinbase_tx_bytes.len() + self.tx_hashes.len() * 32,
        );
        out.extend_from_slice(&self.header_bytes);
        out.extend_from_slice(&self.coinbase_tx_bytes);
        for hash in &self.tx_hashes {
            out.extend_from_slice(hash);
        }
        out
    }
}

/// The light-client contract stores and returns header hashes in
/// little-endian on-wire order; Bitcoin tooling uses the reverse ("display")
/// order. This reverses a full 32-byte array and is its own inverse, so it
/// is applied identically on the way in and on the way out (spec.md §8
/// testable property 3).
pub fn reverse_hash(hash: Hash32) -> Hash32 {
    let mut reversed = hash;
    reversed.reverse();
    reversed
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn reversal_is_its_own_inverse() {
        let mut hash = [0u8; 32];
        for (i, b) in hash.iter_mut().enumerate() {
            *b = i as u8;
        }
        assert_eq!(reverse_hash(reverse_hash(hash)), hash);
    }

    #[test]
    fn reversal_swaps_first_and_last_byte() {
        let mut hash = [0u8; 32];
        hash[0] = 0xAB;
        hash[31] = 0xCD;
        let reversed = reverse_hash(hash);
        assert_eq!(reversed[0], 0xCD);
        assert_eq!(reversed[31], 0xAB);
    }
}
