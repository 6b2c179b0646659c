//! Unit and mock-chain tests for header bundle packaging.

use ethereum_types::H160;
use rlp::Rlp;
use std::sync::Arc;
use wiremock::MockServer;

use relayer::error::RelayError;
use relayer::header::{
    committed_seals_rlp, package, package_header, ConsensusExtra, EXTRA_VANITY,
};
use relayer::rpc::{ChainClient, Header};

mod helpers;
use helpers::{header_json, mount_rpc, sample_extra};

fn header_with_extra(extra_data: &[u8]) -> Header {
    serde_json::from_value(header_json(extra_data)).unwrap()
}

/// Encoding behind a vanity prefix and extracting again is lossless.
#[test]
fn test_extra_round_trip() {
    let extra = sample_extra();
    let encoded = extra.encode_with_vanity(&[0x7a; EXTRA_VANITY]);
    assert_eq!(ConsensusExtra::extract(&encoded).unwrap(), extra);
}

/// extraData without an extension after the vanity prefix is an invalid
/// header, with no fallback format.
#[test]
fn test_extract_rejects_missing_extension() {
    assert!(matches!(
        ConsensusExtra::extract(&[0u8; EXTRA_VANITY]),
        Err(RelayError::InvalidHeader(_))
    ));
    assert!(matches!(
        ConsensusExtra::extract(&[]),
        Err(RelayError::InvalidHeader(_))
    ));
}

/// Garbage after the vanity prefix is an invalid header, not a panic.
#[test]
fn test_extract_rejects_undecodable_extension() {
    let mut extra = vec![0u8; EXTRA_VANITY];
    extra.extend_from_slice(&[0xff, 0x01, 0x02]);
    assert!(matches!(
        ConsensusExtra::extract(&extra),
        Err(RelayError::InvalidHeader(_))
    ));
}

/// Filtering strips both signature fields but keeps the validator set.
#[test]
fn test_filtered_extra() {
    let filtered = sample_extra().filtered();
    assert_eq!(filtered.validators, sample_extra().validators);
    assert!(filtered.seal.is_empty());
    assert!(filtered.committed_seals.is_empty());
}

/// The canonical header is a 15-field RLP list whose extraData field holds
/// the filtered extension behind the original vanity.
#[test]
fn test_canonical_header_layout() {
    let extra = sample_extra();
    let vanity = [0x7a; EXTRA_VANITY];
    let header = header_with_extra(&extra.encode_with_vanity(&vanity));

    let bundle = package_header(&header).unwrap();
    let rlp = Rlp::new(&bundle.canonical_header);
    assert_eq!(rlp.item_count().unwrap(), 15);

    let canonical_extra: Vec<u8> = rlp.val_at(12).unwrap();
    assert_eq!(canonical_extra, extra.filtered().encode_with_vanity(&vanity));

    let miner: H160 = rlp.val_at(2).unwrap();
    assert_eq!(miner, header.miner);
}

/// The committed seals travel as an independent RLP list of raw seals.
#[test]
fn test_committed_seals_encoding() {
    let extra = sample_extra();
    let encoded = committed_seals_rlp(&extra);
    let decoded: Vec<Vec<u8>> = Rlp::new(&encoded).as_list().unwrap();
    assert_eq!(decoded, extra.committed_seals);
}

/// Packaging is deterministic per height.
#[test]
fn test_package_header_deterministic() {
    let header = header_with_extra(&sample_extra().encode_with_vanity(&[0u8; EXTRA_VANITY]));
    assert_eq!(
        package_header(&header).unwrap(),
        package_header(&header).unwrap()
    );
}

/// End to end against a mock chain: fetch, strip, encode.
#[tokio::test]
async fn test_package_from_chain() {
    let server = MockServer::start().await;
    let extra = sample_extra();
    mount_rpc(
        &server,
        "eth_getBlockByNumber",
        header_json(&extra.encode_with_vanity(&[0u8; EXTRA_VANITY])),
    )
    .await;

    let client = Arc::new(ChainClient::new(&server.uri(), 60).unwrap());
    let bundle = package(&client, 16).await.unwrap();
    assert_eq!(bundle.committed_seals, committed_seals_rlp(&extra));
}

/// A header whose extension is absent fails as InvalidHeader through the
/// whole packaging path.
#[tokio::test]
async fn test_package_rejects_headless_extra() {
    let server = MockServer::start().await;
    mount_rpc(
        &server,
        "eth_getBlockByNumber",
        header_json(&[0u8; EXTRA_VANITY]),
    )
    .await;

    let client = Arc::new(ChainClient::new(&server.uri(), 60).unwrap());
    let result = package(&client, 16).await;
    assert!(matches!(result, Err(RelayError::InvalidHeader(_))));
}
