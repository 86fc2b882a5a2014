//! Test-case generation: from a specification and a scenario to an
//! abstract test case (ATC), and from an abstract test case to a
//! concrete one (CTC).
//!
//! The ATC generator lowers a specification plus an ordered scenario of
//! API-block names into a straight-line program with symbolic inputs.
//! The CTC driver then alternates rewriting, symbolic execution, and
//! constraint solving until no symbolic input remains.

pub mod ctc;
pub mod genatc;

pub use ctc::{is_abstract, is_input_stmt, Tester, TesterError};
pub use genatc::AtcGenerator;
