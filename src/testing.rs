//! Testing utilities for ingestion code.
//!
//! - **Mock I/O**: readers that return short reads or fail on demand, and
//!   temporary input files (plain or gzip'd)
//! - **Fixtures**: generated user CSV inputs with known keys
//! - **Boundary helpers**: run only the window/boundary stage over a byte
//!   slice and look at the records it produces
//!
//! ```
//! use chunkfold::testing::*;
//!
//! let input = users_csv(3);
//! let resolved = resolve_records(input.as_bytes(), 7, b'\n').unwrap();
//! assert_eq!(resolved.records.len(), 3);
//! assert!(resolved.tail.is_none());
//! ```

pub mod fixtures;
pub mod mock_io;

pub use fixtures::*;
pub use mock_io::*;
