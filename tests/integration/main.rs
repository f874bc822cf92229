//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises the driver against
//! the mock bus, supply and host framework in [`mock_hw`]. All tests run
//! on the host with no real hardware required.

mod attach_tests;
mod mock_hw;
