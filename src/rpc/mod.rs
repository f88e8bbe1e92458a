// ============================================================================
// RPC MODULE - Node access, proxying and offline fallback
// ============================================================================
//
// - `envelope`: JSON-RPC 2.0 request/response types and error codes
// - `node`:     HTTP client for the external blockchain node
// - `mock`:     demo stand-in for four methods when the node is unreachable
// - `proxy`:    the POST /api/rpc relay that ties the two together

pub mod envelope;
pub mod mock;
pub mod node;
pub mod proxy;

pub use envelope::{JsonRpcRequest, JsonRpcResponse, ProxyCall, RpcErrorObject};
pub use mock::{MockError, MockNode};
pub use node::{NodeClient, NodeError, SendParams};
pub use proxy::RpcProxy;
