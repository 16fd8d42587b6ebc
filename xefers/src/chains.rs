use serde::Serialize;

/// Network metadata for one supported chain.
///
/// The table is fixed at compile time; entries are looked up by numeric chain
/// id and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainInfo {
    pub id: u64,
    pub name: &'static str,
    pub rpc_url: &'static str,
    /// Block explorer base, with a trailing slash.
    pub explorer_url: &'static str,
    /// Native token symbol.
    pub symbol: &'static str,
}

const CHAIN_OPTIONS: &[ChainInfo] = &[
    ChainInfo {
        id: 199,
        name: "BitTorrent Chain Mainnet",
        rpc_url: "https://rpc.bittorrentchain.io",
        explorer_url: "https://bttcscan.com/",
        symbol: "BTT",
    },
    ChainInfo {
        id: 297,
        name: "Hedera Previewnet",
        rpc_url: "https://previewnet.hashio.io/api",
        explorer_url: "https://hashscan.io/previewnet/",
        symbol: "HBAR",
    },
    ChainInfo {
        id: 1029,
        name: "BitTorrent Chain Donau",
        rpc_url: "https://pre-rpc.bittorrentchain.io/",
        explorer_url: "https://testnet.bttcscan.com/",
        symbol: "BTT",
    },
];

/// Chain used when the environment does not name one.
pub const DEFAULT_CHAIN_ID: u64 = 1029;

/// Looks up a chain by id. `None` means "unsupported network" and callers
/// must decline further action rather than guess.
#[must_use]
pub fn lookup(chain_id: u64) -> Option<&'static ChainInfo> {
    CHAIN_OPTIONS.iter().find(|c| c.id == chain_id)
}

/// All chains the registry knows about.
#[must_use]
pub fn supported_chains() -> &'static [ChainInfo] {
    CHAIN_OPTIONS
}

/// The wallet-facing network identifier for a chain id: `0x` followed by the
/// lower-case hexadecimal encoding of the decimal id.
#[must_use]
pub fn to_network_handle(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

/// Explorer page for an address on the given chain.
#[must_use]
pub fn explorer_address_url(chain: &ChainInfo, address: &str) -> String {
    format!("{}address/{}", chain.explorer_url, address)
}

/// Explorer page for a transaction on the given chain.
#[must_use]
pub fn explorer_tx_url(chain: &ChainInfo, hash: &str) -> String {
    format!("{}tx/{}", chain.explorer_url, hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn lookup_known_chains() {
        assert_eq!(lookup(199).map(|c| c.name), Some("BitTorrent Chain Mainnet"));
        assert_eq!(lookup(1029).map(|c| c.symbol), Some("BTT"));
        assert_eq!(lookup(297).map(|c| c.symbol), Some("HBAR"));
    }

    #[test]
    fn lookup_unknown_chain_is_none() {
        assert_eq!(lookup(1), None);
        assert_eq!(lookup(0), None);
    }

    #[test]
    fn network_handle_is_lowercase_hex() {
        assert_eq!(to_network_handle(1029), "0x405");
        assert_eq!(to_network_handle(199), "0xc7");
        assert_eq!(to_network_handle(297), "0x129");
    }

    #[test]
    fn explorer_urls() {
        let chain = lookup(1029).unwrap();
        assert_eq!(
            explorer_address_url(chain, "0xDEF"),
            "https://testnet.bttcscan.com/address/0xDEF"
        );
        assert_eq!(
            explorer_tx_url(chain, "0xabc"),
            "https://testnet.bttcscan.com/tx/0xabc"
        );
    }

    #[test]
    fn default_chain_is_registered() {
        assert!(lookup(DEFAULT_CHAIN_ID).is_some());
    }
}
