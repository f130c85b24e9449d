//! HTTP header name constants.
//!
//! Response headers are stored with lower-case names, so every constant here is
//! lower-case and can be used directly as a lookup key.

// Security header names
/// Content Security Policy header
pub const HEADER_CONTENT_SECURITY_POLICY: &str = "content-security-policy";
/// HTTP Strict Transport Security header
pub const HEADER_STRICT_TRANSPORT_SECURITY: &str = "strict-transport-security";
/// X-Content-Type-Options header
pub const HEADER_X_CONTENT_TYPE_OPTIONS: &str = "x-content-type-options";
/// X-Frame-Options header
pub const HEADER_X_FRAME_OPTIONS: &str = "x-frame-options";

// Infrastructure/Server identification
/// Server header (identifies server software)
pub const HEADER_SERVER: &str = "server";
/// X-Powered-By header (identifies server framework)
pub const HEADER_X_POWERED_BY: &str = "x-powered-by";
/// X-AspNet-Version header
pub const HEADER_X_ASPNET_VERSION: &str = "x-aspnet-version";
/// X-AspNetMvc-Version header
pub const HEADER_X_ASPNETMVC_VERSION: &str = "x-aspnetmvc-version";

/// Headers whose mere presence discloses the server stack version.
pub const VERSION_DISCLOSURE_HEADERS: &[&str] = &[
    HEADER_X_POWERED_BY,
    HEADER_X_ASPNET_VERSION,
    HEADER_X_ASPNETMVC_VERSION,
];
