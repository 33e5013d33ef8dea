//! End-to-end flows.
//!
//! Each test builds a full `App` over the in-memory adapters and drives it
//! through the public use-case containers only.
