//! Header bundle packaging for the destination verifier.
//!
//! The chain embeds its consensus extension in the header's `extraData`:
//! 32 vanity bytes followed by an RLP list of validators, the proposer's
//! seal and the committed-seal list. The destination verifier re-hashes the
//! header with the signature fields stripped, so the canonical encoding
//! replaces `extraData` with a filtered extension (validators kept, seals
//! emptied). The committed seals travel separately so the verifier can
//! re-derive the signer set.

use ethereum_types::H160;
use rlp::{Rlp, RlpStream};
use tracing::debug;

use crate::error::{RelayError, Result};
use crate::rpc::{ChainClient, Header};

/// Vanity prefix length ahead of the consensus extension.
pub const EXTRA_VANITY: usize = 32;

/// Consensus extension embedded in a header's extraData.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsensusExtra {
    pub validators: Vec<H160>,
    pub seal: Vec<u8>,
    pub committed_seals: Vec<Vec<u8>>,
}

impl ConsensusExtra {
    /// Extracts the extension from raw extraData. Absent or undecodable
    /// extension data is `InvalidHeader`; there is no fallback format.
    pub fn extract(extra_data: &[u8]) -> Result<Self> {
        if extra_data.len() <= EXTRA_VANITY {
            return Err(RelayError::InvalidHeader(format!(
                "extraData of {} bytes has no consensus extension",
                extra_data.len()
            )));
        }
        let rlp = Rlp::new(&extra_data[EXTRA_VANITY..]);
        let decode = |what: &str, e: rlp::DecoderError| {
            RelayError::InvalidHeader(format!("consensus extension {}: {}", what, e))
        };
        let validators: Vec<H160> = rlp
            .list_at(0)
            .map_err(|e| decode("validator list", e))?;
        let seal: Vec<u8> = rlp.val_at(1).map_err(|e| decode("seal", e))?;
        let committed_seals: Vec<Vec<u8>> = rlp
            .list_at(2)
            .map_err(|e| decode("committed seals", e))?;
        Ok(Self {
            validators,
            seal,
            committed_seals,
        })
    }

    /// Encodes the extension behind the given vanity prefix, producing a
    /// complete extraData value.
    pub fn encode_with_vanity(&self, vanity: &[u8]) -> Vec<u8> {
        let mut extra = vec![0u8; EXTRA_VANITY];
        let take = vanity.len().min(EXTRA_VANITY);
        extra[..take].copy_from_slice(&vanity[..take]);

        let mut s = RlpStream::new_list(3);
        s.append_list::<H160, H160>(&self.validators);
        s.append(&self.seal);
        s.begin_list(self.committed_seals.len());
        for seal in &self.committed_seals {
            s.append(seal);
        }
        extra.extend_from_slice(&s.out());
        extra
    }

    /// The extension with both signature fields stripped, as covered by the
    /// signature-independent header hash.
    pub fn filtered(&self) -> Self {
        Self {
            validators: self.validators.clone(),
            seal: Vec::new(),
            committed_seals: Vec::new(),
        }
    }
}

/// The canonical (signature-stripped) header and the committed consensus
/// seals of one block, both RLP encoded. Produced once per block height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderBundle {
    pub canonical_header: Vec<u8>,
    pub committed_seals: Vec<u8>,
}

/// RLP of the header with its extraData replaced by `extra_data`.
fn header_rlp(header: &Header, extra_data: &[u8]) -> Vec<u8> {
    let mut s = RlpStream::new_list(15);
    s.append(&header.parent_hash);
    s.append(&header.sha3_uncles);
    s.append(&header.miner);
    s.append(&header.state_root);
    s.append(&header.transactions_root);
    s.append(&header.receipts_root);
    s.append(&header.logs_bloom);
    s.append(&header.difficulty);
    s.append(&header.number);
    s.append(&header.gas_limit);
    s.append(&header.gas_used);
    s.append(&header.timestamp);
    s.append(&extra_data.to_vec());
    s.append(&header.mix_hash);
    s.append(&header.nonce);
    s.out().to_vec()
}

/// Canonical encoding of a header: consensus signature fields stripped from
/// the extension, everything else untouched.
pub fn filtered_header_rlp(header: &Header) -> Result<Vec<u8>> {
    let extra = ConsensusExtra::extract(&header.extra_data)?;
    let filtered = extra.filtered().encode_with_vanity(&header.extra_data[..EXTRA_VANITY]);
    Ok(header_rlp(header, &filtered))
}

/// Independent encoding of the committed-seal list.
pub fn committed_seals_rlp(extra: &ConsensusExtra) -> Vec<u8> {
    let mut s = RlpStream::new();
    s.begin_list(extra.committed_seals.len());
    for seal in &extra.committed_seals {
        s.append(seal);
    }
    s.out().to_vec()
}

/// Packages the header bundle for `height`: fetches the full header, strips
/// the signature fields for the canonical encoding and extracts the
/// committed seals. Fails with `InvalidHeader` when the extension is absent
/// or malformed; the pipeline does not proceed without it.
pub async fn package(client: &ChainClient, height: u64) -> Result<HeaderBundle> {
    let header = client.header_by_number(height).await?;
    package_header(&header)
}

/// Packages an already fetched header.
pub fn package_header(header: &Header) -> Result<HeaderBundle> {
    let extra = ConsensusExtra::extract(&header.extra_data)?;
    let canonical_header = filtered_header_rlp(header)?;
    let committed_seals = committed_seals_rlp(&extra);
    debug!(
        height = header.number.as_u64(),
        validators = extra.validators.len(),
        seals = extra.committed_seals.len(),
        "header packaged"
    );
    Ok(HeaderBundle {
        canonical_header,
        committed_seals,
    })
}
