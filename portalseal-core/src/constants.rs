/// Request header carrying the negotiated handshake identifier.
pub const HANDSHAKE_HEADER: &str = "x-itd-handshake";

/// HTTP status signalling a missing or expired handshake (Upgrade Required).
pub const HANDSHAKE_REQUIRED_STATUS: u16 = 426;

/// Route accepting client public keys.
pub const NEGOTIATE_PATH: &str = "/api/auth/handshake";

/// Prefix stripped from request paths to form logical endpoint names.
pub const API_PREFIX: &str = "/api/";

/// Key version issued by default.
pub const DEFAULT_KID: &str = "v1";

/// HKDF info string for the `v1` key-derivation parameter set.
pub const HKDF_INFO_V1: &str = "itd-auth-payload-v1";

/// Algorithm tag carried by every bundle.
pub const ALG_A256GCM: &str = "A256GCM";

/// Separator used to join AAD context parts.
pub const AAD_SEPARATOR: &str = "|";

/// Derived session key length (AES-256).
pub const SESSION_KEY_LEN: usize = 32;

/// AES-GCM nonce length.
pub const GCM_NONCE_LEN: usize = 12;

/// AES-GCM authentication tag length.
pub const GCM_TAG_LEN: usize = 16;

/// Random bytes drawn for a handshake identifier.
pub const HANDSHAKE_ID_ENTROPY_LEN: usize = 16;

/// Default server-side handshake lifetime: 10 minutes.
pub const DEFAULT_HANDSHAKE_TTL_SECS: u64 = 600;
