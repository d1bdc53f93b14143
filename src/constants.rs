/// Application constants

pub const API_VERSION: &str = "v1";

// Deployed reaction game contract
pub const DEFAULT_SCORE_CONTRACT_ADDRESS: &str = "0x2Ae02A3E11b8b23328127e0169b8Ae28867B7DE2";

// Required network (Monad Testnet)
pub const DEFAULT_CHAIN_ID: u64 = 666;
pub const DEFAULT_CHAIN_NAME: &str = "Monad Testnet";
pub const DEFAULT_CURRENCY_NAME: &str = "MON";
pub const DEFAULT_CURRENCY_SYMBOL: &str = "MON";
pub const DEFAULT_CURRENCY_DECIMALS: u8 = 18;
pub const DEFAULT_CHAIN_RPC_URL: &str = "https://testnet-rpc.monad.xyz";
pub const DEFAULT_CHAIN_EXPLORER_URL: &str = "https://testnet-explorer.monad.xyz";

// EIP-1193 provider error codes
pub const RPC_USER_REJECTED: i64 = 4001;
pub const RPC_UNRECOGNIZED_CHAIN: i64 = 4902;
pub const RPC_INTERNAL_ERROR: i64 = -32603;

// Wallet RPC methods
pub const METHOD_REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
pub const METHOD_ACCOUNTS: &str = "eth_accounts";
pub const METHOD_CHAIN_ID: &str = "eth_chainId";
pub const METHOD_SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
pub const METHOD_ADD_CHAIN: &str = "wallet_addEthereumChain";

// Score bounds in milliseconds
pub const DEFAULT_MIN_SCORE_MS: u64 = 1;
pub const DEFAULT_MAX_SCORE_MS: u64 = 10_000;

// Transaction tracking
pub const DEFAULT_TX_CONFIRMATIONS: usize = 1;
pub const DEFAULT_RECEIPT_POLL_MS: u64 = 2_000;
pub const DEFAULT_WALLET_EVENT_POLL_MS: u64 = 1_500;
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

// WebSocket
pub const WS_HEARTBEAT_INTERVAL_SECS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECS: u64 = 60;
