//! Script modules used by stake redemption
//!
//! `AUGMENTED_CONDITION` with curried `(CONDITION INNER_PUZZLE)` runs the inner
//! puzzle and prepends `CONDITION` to its output: `(c 2 (a 5 11))`. It is small
//! enough to assemble here.
//!
//! `P2_1_OF_N` with curried `MERKLE_ROOT` takes `(proof puzzle solution)`,
//! folds `sha256tree(puzzle)` through the proof and runs the puzzle only if
//! the result equals the root. Stake coins on chain commit to the hash of its
//! compiled form, so the serialized module is embedded byte for byte.

use std::sync::OnceLock;

use crate::types::{Bytes32, Program, ProgramError};

const OP_APPLY: u8 = 2;
const OP_CONS: u8 = 4;

/// Compiled `p2_1_of_n` module
const P2_1_OF_N_BYTES: [u8; 280] = [
    0xff, 0x02, 0xff, 0xff, 0x01, 0xff, 0x02, 0xff, 0xff, 0x03, 0xff, 0xff,
    0x09, 0xff, 0x05, 0xff, 0xff, 0x02, 0xff, 0x06, 0xff, 0xff, 0x04, 0xff,
    0x02, 0xff, 0xff, 0x04, 0xff, 0xff, 0x0b, 0xff, 0xff, 0x01, 0x01, 0xff,
    0xff, 0x02, 0xff, 0x04, 0xff, 0xff, 0x04, 0xff, 0x02, 0xff, 0xff, 0x04,
    0xff, 0x17, 0xff, 0x80, 0x80, 0x80, 0x80, 0x80, 0xff, 0xff, 0x04, 0xff,
    0x0b, 0xff, 0x80, 0x80, 0x80, 0x80, 0x80, 0x80, 0xff, 0xff, 0x01, 0xff,
    0x02, 0xff, 0x17, 0xff, 0x2f, 0x80, 0xff, 0xff, 0x01, 0xff, 0x08, 0x80,
    0x80, 0xff, 0x01, 0x80, 0xff, 0xff, 0x04, 0xff, 0xff, 0x01, 0xff, 0xff,
    0x02, 0xff, 0xff, 0x03, 0xff, 0xff, 0x07, 0xff, 0x05, 0x80, 0xff, 0xff,
    0x01, 0xff, 0x0b, 0xff, 0xff, 0x01, 0x02, 0xff, 0xff, 0x02, 0xff, 0x04,
    0xff, 0xff, 0x04, 0xff, 0x02, 0xff, 0xff, 0x04, 0xff, 0x09, 0xff, 0x80,
    0x80, 0x80, 0x80, 0xff, 0xff, 0x02, 0xff, 0x04, 0xff, 0xff, 0x04, 0xff,
    0x02, 0xff, 0xff, 0x04, 0xff, 0x0d, 0xff, 0x80, 0x80, 0x80, 0x80, 0x80,
    0xff, 0xff, 0x01, 0xff, 0x0b, 0xff, 0xff, 0x01, 0x01, 0xff, 0x05, 0x80,
    0x80, 0xff, 0x01, 0x80, 0xff, 0x02, 0xff, 0xff, 0x03, 0xff, 0x1b, 0xff,
    0xff, 0x01, 0xff, 0x02, 0xff, 0x06, 0xff, 0xff, 0x04, 0xff, 0x02, 0xff,
    0xff, 0x04, 0xff, 0xff, 0x02, 0xff, 0xff, 0x03, 0xff, 0xff, 0x18, 0xff,
    0xff, 0x01, 0x01, 0xff, 0x13, 0x80, 0xff, 0xff, 0x01, 0xff, 0x0b, 0xff,
    0xff, 0x01, 0x02, 0xff, 0x2b, 0xff, 0x05, 0x80, 0xff, 0xff, 0x01, 0xff,
    0x0b, 0xff, 0xff, 0x01, 0x02, 0xff, 0x05, 0xff, 0x2b, 0x80, 0x80, 0xff,
    0x01, 0x80, 0xff, 0xff, 0x04, 0xff, 0xff, 0x04, 0xff, 0xff, 0x17, 0xff,
    0x13, 0xff, 0xff, 0x01, 0x81, 0xff, 0x80, 0xff, 0x3b, 0x80, 0xff, 0x80,
    0x80, 0x80, 0x80, 0x80, 0xff, 0xff, 0x01, 0x05, 0x80, 0xff, 0x01, 0x80,
    0xff, 0x01, 0x80, 0x80,
];

/// Tree hash of the compiled `p2_1_of_n` module
pub const P2_1_OF_N_HASH: Bytes32 = Bytes32([
    0x46, 0xb2, 0x9f, 0xd8, 0x7f, 0xbe, 0xb6, 0x73,
    0x76, 0x00, 0xc4, 0x54, 0x39, 0x31, 0x22, 0x2a,
    0x6c, 0x1e, 0xd3, 0xdb, 0x6f, 0xa5, 0x60, 0x1a,
    0x3c, 0xa2, 0x84, 0xa9, 0xf4, 0xef, 0xe7, 0x80,
]);

fn build_augmented_condition() -> Program {
    let call = |code: u8, args: [Program; 2]| {
        Program::list(std::iter::once(Program::int(code as i128)).chain(args))
    };
    call(
        OP_CONS,
        [Program::int(2), call(OP_APPLY, [Program::int(5), Program::int(11)])],
    )
}

pub fn augmented_condition_mod() -> &'static Program {
    static MOD: OnceLock<Program> = OnceLock::new();
    MOD.get_or_init(build_augmented_condition)
}

pub fn augmented_condition_mod_hash() -> Bytes32 {
    static HASH: OnceLock<Bytes32> = OnceLock::new();
    *HASH.get_or_init(|| augmented_condition_mod().tree_hash())
}

pub fn p2_1_of_n_mod() -> Result<&'static Program, ProgramError> {
    static MOD: OnceLock<Result<Program, ProgramError>> = OnceLock::new();
    MOD.get_or_init(|| Program::from_bytes(&P2_1_OF_N_BYTES))
        .as_ref()
        .map_err(Clone::clone)
}

pub fn p2_1_of_n_mod_hash() -> Bytes32 {
    P2_1_OF_N_HASH
}
