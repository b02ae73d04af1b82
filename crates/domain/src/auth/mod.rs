//! Authentication domain types.
//!
//! A bearer credential is an opaque JWT string. The client never verifies
//! the signature; it only decodes the payload to learn who the token belongs
//! to and when it stops being accepted.

mod claims;

pub use claims::{Claims, ClaimsError, Credential, encode_unsigned};
