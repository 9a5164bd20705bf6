//! Span attribute names for routed AI requests.
//!
//! Provider-level fields follow the OTel GenAI semantic conventions; the
//! `airelay.*` fields describe routing decisions.
//!
//! Span naming convention: `"route {use_case}"` (e.g. `"route chatbot"`).

/// The name of the operation being performed (e.g. "route", "probe").
pub const GEN_AI_OPERATION_NAME: &str = "gen_ai.operation.name";

/// The name of the provider that answered (or "fallback").
pub const GEN_AI_PROVIDER_NAME: &str = "gen_ai.provider.name";

/// The model that produced the answer.
pub const GEN_AI_RESPONSE_MODEL: &str = "gen_ai.response.model";

/// Use case the request was routed for.
pub const AIRELAY_USE_CASE: &str = "airelay.use_case";

/// Number of providers attempted, including the one that answered.
pub const AIRELAY_ATTEMPTS: &str = "airelay.attempts";

/// True when the answer is a synthetic fallback.
pub const AIRELAY_FALLBACK: &str = "airelay.fallback";

// --- Operation name values ---

/// A routed request through the failover chain.
pub const OP_ROUTE: &str = "route";

/// A connection test or sweep probe.
pub const OP_PROBE: &str = "probe";
