use serde::Serialize;

/// The base asset of an EVM network, the one moved by a native transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

/// Definition of an EVM-compatible blockchain network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EvmChain {
    pub id: u64,
    pub name: &'static str,
    pub native_currency: NativeCurrency,
    pub explorer_url: &'static str,
}

impl EvmChain {
    /// Block explorer link for a transaction hash.
    pub fn explorer_tx_url(&self, tx_hash: &str) -> String {
        format!("{}/tx/{}", self.explorer_url, tx_hash)
    }
}

const ETHER: NativeCurrency = NativeCurrency {
    name: "Ether",
    symbol: "ETH",
    decimals: 18,
};

const MATIC: NativeCurrency = NativeCurrency {
    name: "MATIC",
    symbol: "MATIC",
    decimals: 18,
};

/// Ethereum Mainnet (chain ID 1).
pub const MAINNET: EvmChain = EvmChain {
    id: 1,
    name: "Ethereum",
    native_currency: ETHER,
    explorer_url: "https://etherscan.io",
};

/// Polygon PoS (chain ID 137).
pub const POLYGON: EvmChain = EvmChain {
    id: 137,
    name: "Polygon",
    native_currency: MATIC,
    explorer_url: "https://polygonscan.com",
};
